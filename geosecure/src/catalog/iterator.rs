// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Iterators that release their source when closed
//!
//! Adapters own the iterator they wrap, so closing (or dropping) the outer
//! iterator drops and thereby closes every iterator underneath it.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub struct CloseableIterator<T> {
    inner: Box<dyn Iterator<Item = T> + Send>,
    closed: Arc<AtomicBool>,
}

impl<T: 'static> CloseableIterator<T> {
    pub fn new<I>(iter: I) -> Self
    where
        I: Iterator<Item = T> + Send + 'static,
    {
        Self {
            inner: Box::new(iter),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn empty() -> Self {
        Self::new(std::iter::empty())
    }

    /// Release the source; further calls to `next` return `None`
    pub fn close(&mut self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.inner = Box::new(std::iter::empty());
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Shared flag observing whether this iterator has been closed
    pub fn close_flag(&self) -> Arc<AtomicBool> {
        self.closed.clone()
    }

    /// Transform items, dropping those mapped to `None`
    pub fn filter_map_items<U, F>(self, f: F) -> CloseableIterator<U>
    where
        U: 'static,
        F: FnMut(T) -> Option<U> + Send + 'static,
    {
        CloseableIterator::new(Adapter { source: self, f })
    }

    /// Skip `offset` items and stop after `count`; closing the page closes
    /// this iterator
    pub fn paged(self, offset: Option<usize>, count: Option<usize>) -> Self {
        if offset.is_none() && count.is_none() {
            return self;
        }
        CloseableIterator::new(self.skip(offset.unwrap_or(0)).take(count.unwrap_or(usize::MAX)))
    }
}

impl<T> Iterator for CloseableIterator<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.closed.load(Ordering::SeqCst) {
            return None;
        }
        self.inner.next()
    }
}

impl<T> Drop for CloseableIterator<T> {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

impl<T> fmt::Debug for CloseableIterator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloseableIterator")
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish()
    }
}

struct Adapter<T, F> {
    source: CloseableIterator<T>,
    f: F,
}

impl<T, U, F> Iterator for Adapter<T, F>
where
    F: FnMut(T) -> Option<U>,
{
    type Item = U;

    fn next(&mut self) -> Option<U> {
        loop {
            let item = self.source.next()?;
            if let Some(mapped) = (self.f)(item) {
                return Some(mapped);
            }
        }
    }
}

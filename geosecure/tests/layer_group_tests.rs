//! Layer group containment
//!
//! How named, container, opaque, single and EO groups gate direct access to
//! their members, and how secured groups filter their member lists.

#[path = "testutils/mod.rs"]
mod testutils;

use geosecure::catalog::{InfoType, LayerGroupInfo, LayerGroupMode, Query, SortBy};
use geosecure::{AccessMode, ResourceAccessManager};
use testutils::security_fixture::{SecurityFixture, MILITARY_NURC, WIDE_OPEN};
use testutils::users::{self, plain, wfs, wms};

#[test]
fn test_opaque_container_hides_members() {
    let fixture = SecurityFixture::new(WIDE_OPEN).expect("Failed to create test fixture");
    fixture.add_group(
        "G",
        None,
        LayerGroupMode::OpaqueContainer,
        &[&fixture.states, &fixture.roads],
    );
    let secure = fixture.secure();
    let ctx = wms(users::reader(), "GetMap");

    assert!(secure.layer_by_name(&ctx, "topp", "states").is_none());
    assert!(secure.layer_by_name(&ctx, "topp", "roads").is_none());
    assert!(secure.layer_by_name(&plain(users::reader()), "topp", "states").is_none());

    let group = secure
        .layer_group_by_name(&ctx, None, "G")
        .expect("opaque group is visible");
    let names: Vec<String> = group.layers().iter().map(|l| l.info().prefixed_name()).collect();
    assert_eq!(names, vec!["topp:states", "topp:roads"]);

    // layers outside the group are untouched
    assert!(secure.layer_by_name(&ctx, "topp", "landmarks").is_some());
}

#[test]
fn test_non_wms_services_bypass_containment() {
    let fixture = SecurityFixture::new(WIDE_OPEN).expect("Failed to create test fixture");
    fixture.add_group("G", None, LayerGroupMode::OpaqueContainer, &[&fixture.states]);
    let secure = fixture.secure();

    assert!(secure.layer_by_name(&wfs(users::reader(), "GetFeature"), "topp", "states").is_some());
    assert!(secure.layer_by_name(&wms(users::reader(), "GetMap"), "topp", "states").is_none());
}

#[test]
fn test_administrator_sees_contained_layers() {
    let fixture = SecurityFixture::new(WIDE_OPEN).expect("Failed to create test fixture");
    fixture.add_group("G", None, LayerGroupMode::OpaqueContainer, &[&fixture.states]);

    let layer = fixture
        .secure()
        .layer_by_name(&wms(users::admin(), "GetMap"), "topp", "states")
        .expect("administrators bypass containment");
    assert!(layer.data().is_ok());
}

#[test]
fn test_container_gates_members_on_group_visibility() {
    let fixture = SecurityFixture::new("*.*.r=*\nC.r=MILITARY\n").expect("Failed to create test fixture");
    let container = fixture.add_group("C", None, LayerGroupMode::Container, &[&fixture.states]);
    let manager = fixture.manager();

    let reader = wms(users::reader(), "GetMap");
    assert!(!manager.can_access_layer_group(&reader, &container, AccessMode::Read));
    assert!(!manager.can_access_layer(&reader, &fixture.states, AccessMode::Read));
    assert!(manager.can_access_layer(&reader, &fixture.roads, AccessMode::Read));

    let military = wms(users::military(), "GetMap");
    assert!(manager.can_access_layer_group(&military, &container, AccessMode::Read));
    assert!(manager.can_access_layer(&military, &fixture.states, AccessMode::Read));

    // writes are not gated by containment
    assert!(manager.can_access_layer(&reader, &fixture.states, AccessMode::Write));
}

#[test]
fn test_visible_container_exposes_members() {
    let fixture = SecurityFixture::new(WIDE_OPEN).expect("Failed to create test fixture");
    fixture.add_group("C", None, LayerGroupMode::Container, &[&fixture.states]);

    let ctx = wms(users::anonymous(), "GetMap");
    assert!(fixture.secure().layer_by_name(&ctx, "topp", "states").is_some());
}

#[test]
fn test_named_group_does_not_gate_members() {
    let fixture = SecurityFixture::new("*.*.r=*\nN.r=MILITARY\n").expect("Failed to create test fixture");
    let named = fixture.add_group("N", None, LayerGroupMode::Named, &[&fixture.states]);
    let manager = fixture.manager();

    let reader = wms(users::reader(), "GetMap");
    assert!(!manager.can_access_layer_group(&reader, &named, AccessMode::Read));
    assert!(manager.can_access_layer(&reader, &fixture.states, AccessMode::Read));
}

#[test]
fn test_layer_reachable_through_any_container() {
    let fixture = SecurityFixture::new(WIDE_OPEN).expect("Failed to create test fixture");
    fixture.add_group("O", None, LayerGroupMode::OpaqueContainer, &[&fixture.states]);
    let ctx = wms(users::reader(), "GetMap");
    assert!(fixture.secure().layer_by_name(&ctx, "topp", "states").is_none());

    fixture.add_group("N", None, LayerGroupMode::Named, &[&fixture.states]);
    assert!(fixture.secure().layer_by_name(&ctx, "topp", "states").is_some());
}

#[test]
fn test_opaque_nested_in_named_stays_opaque() {
    let fixture = SecurityFixture::new(WIDE_OPEN).expect("Failed to create test fixture");
    let opaque = fixture.add_group("O", None, LayerGroupMode::OpaqueContainer, &[&fixture.states]);
    fixture.add_nesting_group("N", LayerGroupMode::Named, &[&opaque]);
    let secure = fixture.secure();
    let ctx = wms(users::reader(), "GetMap");

    assert!(secure.layer_by_name(&ctx, "topp", "states").is_none());
    assert!(secure.layer_group_by_name(&ctx, None, "O").is_some());

    let named = secure
        .layer_group_by_name(&ctx, None, "N")
        .expect("named group is visible");
    assert_eq!(named.members().len(), 1);
    let layers: Vec<&str> = named.layers().iter().map(|l| l.info().name()).collect();
    assert_eq!(layers, vec!["states"]);
}

#[test]
fn test_single_group_is_transparent() {
    let fixture = SecurityFixture::new("*.*.r=*\nC.r=MILITARY\n").expect("Failed to create test fixture");
    let single = fixture.add_group("S", None, LayerGroupMode::Single, &[&fixture.states]);
    let manager = fixture.manager();
    let reader = wms(users::reader(), "GetMap");

    // a single group alone does not gate its layers
    assert!(manager.can_access_layer(&reader, &fixture.states, AccessMode::Read));

    // but its layers inherit the containment of the groups holding it
    let container = fixture.add_nesting_group("C", LayerGroupMode::Container, &[&single]);
    assert!(!manager.can_access_layer(&reader, &fixture.states, AccessMode::Read));
    assert!(!manager.can_access_layer_group(&reader, &single, AccessMode::Read));
    assert!(!manager.can_access_layer_group(&reader, &container, AccessMode::Read));

    let military = wms(users::military(), "GetMap");
    assert!(manager.can_access_layer(&military, &fixture.states, AccessMode::Read));
}

#[test]
fn test_eo_group_mirrors_root_layer() {
    let fixture = SecurityFixture::new(MILITARY_NURC).expect("Failed to create test fixture");
    let eo = fixture
        .catalog
        .add_layer_group(
            LayerGroupInfo::new("eo", None, LayerGroupMode::Eo)
                .with_root_layer(&fixture.arcgrid)
                .with_layer(&fixture.states),
        )
        .expect("Failed to add layer group");
    let manager = fixture.manager();

    let anonymous = wms(users::anonymous(), "GetMap");
    assert!(!manager.can_access_layer_group(&anonymous, &eo, AccessMode::Read));
    assert!(fixture.secure().layer_group_by_name(&anonymous, None, "eo").is_none());

    let military = wms(users::military(), "GetMap");
    assert!(manager.can_access_layer_group(&military, &eo, AccessMode::Read));
    let secured = fixture
        .secure()
        .layer_group_by_name(&military, None, "eo")
        .expect("military reads the root layer");
    assert!(secured.root_layer().is_some());
}

#[test]
fn test_group_styles_stay_paired_with_layers() {
    let fixture = SecurityFixture::new(MILITARY_NURC).expect("Failed to create test fixture");
    fixture
        .catalog
        .add_layer_group(
            LayerGroupInfo::new("mixed", None, LayerGroupMode::Named)
                .with_styled_layer(&fixture.states, "states_style")
                .with_styled_layer(&fixture.arcgrid, "dem")
                .with_styled_layer(&fixture.roads, "roads_style"),
        )
        .expect("Failed to add layer group");

    let group = fixture
        .secure()
        .layer_group_by_name(&wms(users::anonymous(), "GetMap"), None, "mixed")
        .expect("group is visible");
    let info = group.group();
    assert_eq!(info.layers.len(), 2);
    assert_eq!(info.styles.len(), 2);
    assert_eq!(info.style_at(0), Some("states_style"));
    assert_eq!(info.style_at(1), Some("roads_style"));

    let full = fixture
        .secure()
        .layer_group_by_name(&wms(users::military(), "GetMap"), None, "mixed")
        .expect("group is visible");
    assert_eq!(full.group().style_at(1), Some("dem"));
}

#[test]
fn test_nested_groups_strip_down_instead_of_disappearing() {
    let fixture = SecurityFixture::new(MILITARY_NURC).expect("Failed to create test fixture");
    let rasters = fixture.add_group("rasters", None, LayerGroupMode::Named, &[&fixture.arcgrid]);
    let parent = LayerGroupInfo::new("parent", None, LayerGroupMode::Named)
        .with_layer(&fixture.states)
        .with_group(&rasters);
    fixture.catalog.add_layer_group(parent).expect("Failed to add layer group");

    let ctx = wms(users::anonymous(), "GetMap");
    let secured = fixture
        .secure()
        .layer_group_by_name(&ctx, None, "parent")
        .expect("parent is visible");
    assert_eq!(secured.members().len(), 2);
    assert_eq!(secured.layers().len(), 1);

    let emptied = fixture
        .secure()
        .layer_group_by_name(&ctx, None, "rasters")
        .expect("emptied groups stay visible by default");
    assert!(emptied.is_empty());
}

#[test]
fn test_hide_empty_groups() {
    let fixture = SecurityFixture::hiding_empty_groups(MILITARY_NURC).expect("Failed to create test fixture");
    let rasters = fixture.add_group("rasters", None, LayerGroupMode::Named, &[&fixture.arcgrid]);
    let parent = LayerGroupInfo::new("parent", None, LayerGroupMode::Named)
        .with_layer(&fixture.states)
        .with_group(&rasters);
    fixture.catalog.add_layer_group(parent).expect("Failed to add layer group");
    let secure = fixture.secure();

    let ctx = wms(users::anonymous(), "GetMap");
    assert!(secure.layer_group_by_name(&ctx, None, "rasters").is_none());
    let secured = secure
        .layer_group_by_name(&ctx, None, "parent")
        .expect("parent keeps a visible layer");
    assert_eq!(secured.members().len(), 1);
    assert_eq!(secured.group().layers.len(), 1);

    // administrators always see every group
    let admin = wms(users::admin(), "GetMap");
    assert!(secure.layer_group_by_name(&admin, None, "rasters").is_some());
}

#[test]
fn test_paged_group_listing_skips_hidden_empty_groups() {
    let fixture = SecurityFixture::hiding_empty_groups(MILITARY_NURC).expect("Failed to create test fixture");
    fixture.add_group("a_rasters", None, LayerGroupMode::Named, &[&fixture.arcgrid]);
    fixture.add_group("b_states", None, LayerGroupMode::Named, &[&fixture.states]);
    fixture.add_group("c_roads", None, LayerGroupMode::Named, &[&fixture.roads]);
    let secure = fixture.secure();
    let ctx = wms(users::anonymous(), "GetCapabilities");

    // a_rasters sorts first and is emptied: the page must still hold two groups
    let query = Query::all(InfoType::LayerGroup)
        .sorted_by(SortBy::asc("name"))
        .with_count(2);
    let page: Vec<String> = secure
        .list(&ctx, &query)
        .map(|info| info.name().to_string())
        .collect();
    assert_eq!(page, vec!["b_states", "c_roads"]);

    let next: Vec<String> = secure
        .list(&ctx, &query.clone().with_offset(1))
        .map(|info| info.name().to_string())
        .collect();
    assert_eq!(next, vec!["c_roads"]);

    let admin = wms(users::admin(), "GetCapabilities");
    assert_eq!(secure.list(&admin, &query).count(), 2);
}

#[test]
fn test_group_cycles_terminate() {
    let fixture = SecurityFixture::new(WIDE_OPEN).expect("Failed to create test fixture");
    let inner = fixture.add_group("inner", None, LayerGroupMode::Named, &[&fixture.states]);
    let outer = fixture.add_nesting_group("outer", LayerGroupMode::Named, &[&inner]);
    fixture
        .catalog
        .update_layer_group(inner.clone().with_group(&outer))
        .expect("Failed to update layer group");

    let ctx = wfs(users::reader(), "GetFeature");
    let secured = fixture
        .secure()
        .layer_group_by_name(&ctx, None, "outer")
        .expect("outer is visible");
    assert_eq!(secured.members().len(), 1);
    assert_eq!(secured.layers().len(), 1);
}

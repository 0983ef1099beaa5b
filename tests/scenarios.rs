//! Operation-level scenarios against an in-memory catalog

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use taxon::core::assets::{Asset, AssetStore, TempUpload, UploadedAsset};
use taxon::core::entity::Fields;
use taxon::core::error::{AssetError, ServiceError, StoreError};
use taxon::core::identity::{EntityKind, RecordId};
use taxon::core::resource::{Catalog, ListQuery};
use taxon::core::store::{AssetLedger, Document, DocumentStore, Filter, Page, SqliteStore};
use taxon::entities::{Category, Generic, Location, Subcategory, Supplier, SupplierPatch};
use tempfile::TempDir;

/// Asset store that records live assets and can be told to fail
#[derive(Default)]
struct FakeAssets {
    live: RefCell<Vec<String>>,
    uploads: RefCell<u32>,
    fail_upload: bool,
    fail_destroy: bool,
}

impl FakeAssets {
    fn failing_upload() -> Self {
        Self {
            fail_upload: true,
            ..Default::default()
        }
    }

    fn failing_destroy() -> Self {
        Self {
            fail_destroy: true,
            ..Default::default()
        }
    }

    fn live(&self) -> Vec<String> {
        self.live.borrow().clone()
    }
}

impl AssetStore for FakeAssets {
    fn upload(&self, path: &Path) -> Result<UploadedAsset, AssetError> {
        assert!(path.exists(), "temp file removed before upload");
        if self.fail_upload {
            return Err(AssetError::Rejected {
                status: 500,
                body: "boom".into(),
            });
        }
        *self.uploads.borrow_mut() += 1;
        let storage_id = format!("icons/{}", *self.uploads.borrow());
        self.live.borrow_mut().push(storage_id.clone());
        Ok(UploadedAsset {
            secure_url: format!("https://cdn.test/{}", storage_id),
            storage_id,
        })
    }

    fn destroy(&self, storage_id: &str) -> Result<(), AssetError> {
        if self.fail_destroy {
            return Err(AssetError::Rejected {
                status: 502,
                body: "down".into(),
            });
        }
        self.live.borrow_mut().retain(|s| s != storage_id);
        Ok(())
    }
}

/// SQLite store whose record writes fail
struct BrokenWrites(SqliteStore);

fn broken() -> StoreError {
    StoreError::Corrupt {
        table: "test",
        id: "-".into(),
        message: "disk full".into(),
    }
}

impl DocumentStore for BrokenWrites {
    fn find_by_id(&self, kind: EntityKind, id: &RecordId) -> Result<Option<Document>, StoreError> {
        self.0.find_by_id(kind, id)
    }
    fn find_one(&self, kind: EntityKind, filter: &Filter) -> Result<Option<Document>, StoreError> {
        self.0.find_one(kind, filter)
    }
    fn count(&self, kind: EntityKind, filter: &Filter) -> Result<u64, StoreError> {
        self.0.count(kind, filter)
    }
    fn find(&self, kind: EntityKind, filter: &Filter, page: Page) -> Result<Vec<Document>, StoreError> {
        self.0.find(kind, filter, page)
    }
    fn insert(&self, _kind: EntityKind, _doc: &Document) -> Result<(), StoreError> {
        Err(broken())
    }
    fn replace(&self, _kind: EntityKind, _doc: &Document) -> Result<bool, StoreError> {
        Err(broken())
    }
    fn delete(&self, kind: EntityKind, id: &RecordId) -> Result<Option<Document>, StoreError> {
        self.0.delete(kind, id)
    }
}

impl AssetLedger for BrokenWrites {
    fn record_asset(&self, asset: &Asset) -> Result<(), StoreError> {
        self.0.record_asset(asset)
    }
    fn find_asset_by_url(&self, secure_url: &str) -> Result<Option<Asset>, StoreError> {
        self.0.find_asset_by_url(secure_url)
    }
    fn delete_asset(&self, id: &RecordId) -> Result<bool, StoreError> {
        self.0.delete_asset(id)
    }
    fn list_assets(&self) -> Result<Vec<Asset>, StoreError> {
        self.0.list_assets()
    }
}

fn catalog(assets: FakeAssets) -> Catalog<SqliteStore, FakeAssets> {
    Catalog::new(SqliteStore::open_in_memory().unwrap(), assets)
}

/// Write a throwaway upload file and hand it over as a temp upload
fn upload(dir: &TempDir, name: &str) -> (TempUpload, PathBuf) {
    let path = dir.path().join(name);
    fs::write(&path, b"\x89PNG").unwrap();
    (TempUpload::new(&path), path)
}

fn create_location(c: &Catalog<SqliteStore, FakeAssets>, name: &str) -> RecordId {
    c.resource::<Location>()
        .create(Fields::named(name), None)
        .unwrap()
        .payload
}

fn supplier_fields(name: &str, status: &str) -> Fields<SupplierPatch> {
    Fields::named(name).with_attrs(SupplierPatch {
        category_of_supplier: Some("Wholesaler".into()),
        supplier_product_category: Some("Medicine".into()),
        status: Some(status.into()),
        ..Default::default()
    })
}

#[test]
fn test_create_returns_201_and_id() {
    let c = catalog(FakeAssets::default());
    let reply = c.resource::<Location>().create(Fields::named("  Dhaka "), None).unwrap();
    assert_eq!(reply.status, 201);
    assert_eq!(reply.message, "Location created successfully");

    let shown = c.resource::<Location>().show(&reply.payload.to_string()).unwrap();
    assert_eq!(shown.status, 200);
    assert_eq!(shown.payload.name, "Dhaka");
    assert_eq!(shown.payload.slug, "dhaka");
}

#[test]
fn test_category_name_collision_is_conflict_across_locations() {
    let c = catalog(FakeAssets::default());
    let dhaka = create_location(&c, "Dhaka");
    let ctg = create_location(&c, "Chattogram");
    let categories = c.resource::<Category>();

    categories
        .create(Fields::named("Grocery").with_parent(dhaka), None)
        .unwrap();

    for parent in [dhaka, ctg] {
        let err = categories
            .create(Fields::named("grocery ").with_parent(parent), None)
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert_eq!(err.to_string(), "A category with this name already exists");
        assert_eq!(err.status_code(), 400);
    }
}

#[test]
fn test_missing_parent_is_invalid_reference_and_nothing_persisted() {
    let c = catalog(FakeAssets::default());
    let ghost = RecordId::new();
    let err = c
        .resource::<Category>()
        .create(Fields::named("Bakery").with_parent(ghost), None)
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidReference(_)));
    assert_eq!(err.to_string(), "Location does not exist");
    assert_eq!(c.store().count(EntityKind::Category, &Filter::default()).unwrap(), 0);

    let err = c
        .resource::<Subcategory>()
        .create(Fields::named("Bread"), None)
        .unwrap_err();
    assert_eq!(err.to_string(), "Category ID is required");
}

#[test]
fn test_reference_check_runs_before_upload() {
    let tmp = TempDir::new().unwrap();
    let c = catalog(FakeAssets::default());
    let (file, path) = upload(&tmp, "icon.png");

    let err = c
        .resource::<Category>()
        .create(Fields::named("Bakery").with_parent("not-an-id"), Some(file))
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid Location ID");
    assert_eq!(*c.assets().uploads.borrow(), 0);
    assert!(!path.exists());
}

#[test]
fn test_parent_on_root_kind_is_rejected() {
    let c = catalog(FakeAssets::default());
    let dhaka = create_location(&c, "Dhaka");
    let err = c
        .resource::<Generic>()
        .create(Fields::named("Paracetamol").with_parent(dhaka), None)
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[test]
fn test_failed_upload_leaves_nothing_and_removes_temp_file() {
    let tmp = TempDir::new().unwrap();
    let c = catalog(FakeAssets::failing_upload());
    let (file, path) = upload(&tmp, "icon.png");

    let err = c
        .resource::<Location>()
        .create(Fields::named("Sylhet"), Some(file))
        .unwrap_err();
    assert!(matches!(err, ServiceError::UploadFailure(_)));
    assert_eq!(err.status_code(), 500);
    assert_eq!(c.store().count(EntityKind::Location, &Filter::default()).unwrap(), 0);
    assert!(c.store().list_assets().unwrap().is_empty());
    assert!(!path.exists());
}

#[test]
fn test_temp_file_removed_on_success_and_on_validation_failure() {
    let tmp = TempDir::new().unwrap();
    let c = catalog(FakeAssets::default());

    let (file, path) = upload(&tmp, "ok.png");
    c.resource::<Generic>()
        .create(Fields::named("Omeprazole"), Some(file))
        .unwrap();
    assert!(!path.exists());

    let (file, path) = upload(&tmp, "bad.png");
    let err = c
        .resource::<Generic>()
        .create(Fields::named("   "), Some(file))
        .unwrap_err();
    assert_eq!(err.to_string(), "Name is required");
    assert!(!path.exists());
}

#[test]
fn test_failed_write_detaches_new_asset() {
    let tmp = TempDir::new().unwrap();
    let store = BrokenWrites(SqliteStore::open_in_memory().unwrap());
    let c = Catalog::new(store, FakeAssets::default());
    let (file, path) = upload(&tmp, "icon.png");

    let err = c
        .resource::<Location>()
        .create(Fields::named("Khulna"), Some(file))
        .unwrap_err();
    assert!(matches!(err, ServiceError::Persistence(_)));
    assert!(c.assets().live().is_empty());
    assert!(c.store().list_assets().unwrap().is_empty());
    assert!(!path.exists());
}

#[test]
fn test_update_with_nothing_is_validation_error() {
    let c = catalog(FakeAssets::default());
    let id = create_location(&c, "Dhaka");
    let err = c
        .resource::<Location>()
        .update(&id.to_string(), Fields::default(), None)
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
    assert_eq!(err.to_string(), "No fields to update");
}

#[test]
fn test_update_checks_id_then_existence() {
    let c = catalog(FakeAssets::default());
    let locations = c.resource::<Location>();

    let err = locations.update("xyz", Fields::named("A"), None).unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    let err = locations
        .update(&RecordId::new().to_string(), Fields::named("A"), None)
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
    assert_eq!(err.status_code(), 404);
}

#[test]
fn test_update_is_partial_and_excludes_self_from_uniqueness() {
    let c = catalog(FakeAssets::default());
    let dhaka = create_location(&c, "Dhaka");
    let ctg = create_location(&c, "Chattogram");
    let categories = c.resource::<Category>();
    let id = categories
        .create(Fields::named("Grocery").with_parent(dhaka), None)
        .unwrap()
        .payload;
    categories
        .create(Fields::named("Pharmacy").with_parent(dhaka), None)
        .unwrap();

    // renaming to its own name in another case is not a conflict
    categories
        .update(&id.to_string(), Fields::named("GROCERY"), None)
        .unwrap();
    let err = categories
        .update(&id.to_string(), Fields::named("pharmacy"), None)
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));

    // moving the parent leaves the name alone
    categories
        .update(&id.to_string(), Fields::default().with_parent(ctg), None)
        .unwrap();
    let record = categories.show(&id.to_string()).unwrap().payload;
    assert_eq!(record.name, "GROCERY");
    assert_eq!(record.parent, Some(ctg));
    assert!(record.updated_at >= record.created_at);
}

#[test]
fn test_update_with_bad_parent_changes_nothing() {
    let tmp = TempDir::new().unwrap();
    let c = catalog(FakeAssets::default());
    let dhaka = create_location(&c, "Dhaka");
    let categories = c.resource::<Category>();
    let id = categories
        .create(Fields::named("Grocery").with_parent(dhaka), None)
        .unwrap()
        .payload
        .to_string();
    let before = categories.show(&id).unwrap().payload;

    let cases = [
        ("not-an-id".to_string(), "Invalid Location ID"),
        (RecordId::new().to_string(), "Location does not exist"),
    ];
    for (parent, message) in cases {
        let (file, path) = upload(&tmp, "icon.png");
        let err = categories
            .update(&id, Fields::named("Bakery").with_parent(parent), Some(file))
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidReference(_)));
        assert_eq!(err.to_string(), message);
        assert!(!path.exists());
    }

    assert_eq!(*c.assets().uploads.borrow(), 0);
    assert!(c.store().list_assets().unwrap().is_empty());
    assert_eq!(categories.show(&id).unwrap().payload, before);
}

#[test]
fn test_list_and_show_resolve_parent_names() {
    let c = catalog(FakeAssets::default());
    let dhaka = create_location(&c, "Dhaka");
    let categories = c.resource::<Category>();
    let grocery = categories
        .create(Fields::named("Grocery").with_parent(dhaka), None)
        .unwrap()
        .payload;
    categories
        .create(Fields::named("Pharmacy").with_parent(dhaka), None)
        .unwrap();

    let page = categories.list(ListQuery::new()).unwrap().payload;
    assert_eq!(page.results.len(), 2);
    for record in &page.results {
        assert_eq!(record.parent_name.as_deref(), Some("Dhaka"));
    }

    let subcategories = c.resource::<Subcategory>();
    let snacks = subcategories
        .create(Fields::named("Snacks").with_parent(grocery), None)
        .unwrap()
        .payload;
    let shown = subcategories.show(&snacks.to_string()).unwrap().payload;
    assert_eq!(shown.parent_name.as_deref(), Some("Grocery"));

    // a removed parent leaves the reference dangling without a name
    c.resource::<Location>().remove(&dhaka.to_string()).unwrap();
    let page = categories.list(ListQuery::new()).unwrap().payload;
    assert!(page.results.iter().all(|r| r.parent == Some(dhaka) && r.parent_name.is_none()));

    let locations = c.resource::<Location>().list(ListQuery::new()).unwrap().payload;
    assert!(locations.results.iter().all(|r| r.parent_name.is_none()));
}

#[test]
fn test_mixed_script_names_get_distinct_slugs() {
    let c = catalog(FakeAssets::default());
    create_location(&c, "ঢাকা 1");
    create_location(&c, "চট্টগ্রাম 1");
    create_location(&c, "Café");
    assert_eq!(c.store().count(EntityKind::Location, &Filter::default()).unwrap(), 3);

    let locations = c.resource::<Location>();
    for name in [" ঢাকা  1 ", "CAFÉ"] {
        let err = locations.create(Fields::named(name), None).unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)), "{}", name);
    }
}

#[test]
fn test_blank_keyword_matches_everything_newest_first() {
    let c = catalog(FakeAssets::default());
    for name in ["Dhaka", "Chattogram", "Sylhet", "Rajshahi"] {
        create_location(&c, name);
    }
    let locations = c.resource::<Location>();

    let all = locations.list(ListQuery::new()).unwrap().payload;
    let blank = locations.list(ListQuery::new().keyword("   ")).unwrap().payload;
    assert_eq!(all.count, 4);
    assert_eq!(blank.count, all.count);

    let names: Vec<_> = all.results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Rajshahi", "Sylhet", "Chattogram", "Dhaka"]);
    for pair in all.results.windows(2) {
        assert!(pair[0].created_at >= pair[1].created_at);
    }
}

#[test]
fn test_list_window_validation_and_paging() {
    let c = catalog(FakeAssets::default());
    for i in 0..12 {
        create_location(&c, &format!("Zone {}", i));
    }
    let locations = c.resource::<Location>();

    let page = locations.list(ListQuery::new()).unwrap().payload;
    assert_eq!(page.results.len(), 10);
    assert_eq!(page.count, 12);

    let page = locations.list(ListQuery::new().limit(5).offset(10)).unwrap().payload;
    assert_eq!(page.results.len(), 2);

    let page = locations.list(ListQuery::new().limit(0)).unwrap().payload;
    assert!(page.results.is_empty());
    assert_eq!(page.count, 12);

    for query in [ListQuery::new().limit(-1), ListQuery::new().offset("abc")] {
        let err = locations.list(query).unwrap_err();
        assert_eq!(err.to_string(), "Invalid limit or offset value");
    }
}

#[test]
fn test_keyword_matching_per_kind() {
    let c = catalog(FakeAssets::default());
    let dhaka = create_location(&c, "Dhaka North");
    create_location(&c, "Khulna");

    let locations = c.resource::<Location>();
    assert_eq!(locations.list(ListQuery::new().keyword("north")).unwrap().payload.count, 1);
    let by_id = locations
        .list(ListQuery::new().keyword(dhaka.to_string()))
        .unwrap()
        .payload;
    assert_eq!(by_id.count, 1);
    assert_eq!(by_id.results[0].id, dhaka);

    let generic = c
        .resource::<Generic>()
        .create(Fields::named("Vitamin C"), None)
        .unwrap()
        .payload;
    let generics = c.resource::<Generic>();
    assert_eq!(
        generics.list(ListQuery::new().keyword(generic.to_string())).unwrap().payload.count,
        0
    );
    assert_eq!(generics.list(ListQuery::new().keyword("%")).unwrap().payload.count, 0);
}

#[test]
fn test_supplier_status_is_required_and_not_keyword_searchable() {
    let c = catalog(FakeAssets::default());
    let suppliers = c.resource::<Supplier>();

    let err = suppliers.create(supplier_fields("Acme Pharma", ""), None).unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
    assert_eq!(err.to_string(), "Status is required");

    let id = suppliers
        .create(supplier_fields("Acme Pharma", "Active"), None)
        .unwrap()
        .payload;
    let record = suppliers.show(&id.to_string()).unwrap().payload;
    assert_eq!(record.attrs.status, "Active");

    // keyword covers name and slug, not status
    let page = suppliers.list(ListQuery::new().keyword("Active")).unwrap().payload;
    assert_eq!(page.count, 0);
    assert!(page.results.is_empty());

    let page = suppliers.list(ListQuery::new().keyword("acme-ph")).unwrap().payload;
    assert_eq!(page.count, 1);
}

#[test]
fn test_supplier_update_clears_optional_and_rejects_blank_required() {
    let c = catalog(FakeAssets::default());
    let suppliers = c.resource::<Supplier>();
    let mut fields = supplier_fields("Beximco", "Active");
    fields.attrs.contact_person = Some("Karim".into());
    let id = suppliers.create(fields, None).unwrap().payload.to_string();

    let clear = Fields::default().with_attrs(SupplierPatch {
        contact_person: Some(String::new()),
        ..Default::default()
    });
    suppliers.update(&id, clear, None).unwrap();
    assert_eq!(suppliers.show(&id).unwrap().payload.attrs.contact_person, None);

    let blank = Fields::default().with_attrs(SupplierPatch {
        status: Some(" ".into()),
        ..Default::default()
    });
    let err = suppliers.update(&id, blank, None).unwrap_err();
    assert_eq!(err.to_string(), "Status is required");
    assert_eq!(suppliers.show(&id).unwrap().payload.attrs.status, "Active");
}

#[test]
fn test_supplier_name_allows_300_characters() {
    let c = catalog(FakeAssets::default());
    let suppliers = c.resource::<Supplier>();
    suppliers
        .create(supplier_fields(&"s".repeat(300), "Active"), None)
        .unwrap();
    let err = suppliers
        .create(supplier_fields(&"t".repeat(301), "Active"), None)
        .unwrap_err();
    assert_eq!(err.to_string(), "Supplier name must be at most 300 characters");

    let err = c
        .resource::<Generic>()
        .create(Fields::named("g".repeat(51)), None)
        .unwrap_err();
    assert_eq!(err.to_string(), "Name must be at most 50 characters");
}

#[test]
fn test_second_icon_update_leaves_one_live_asset() {
    let tmp = TempDir::new().unwrap();
    let c = catalog(FakeAssets::default());
    let id = create_location(&c, "Dhaka").to_string();
    let locations = c.resource::<Location>();

    let (first, _) = upload(&tmp, "first.png");
    locations.update(&id, Fields::default(), Some(first)).unwrap();
    let (second, second_path) = upload(&tmp, "second.png");
    locations.update(&id, Fields::default(), Some(second)).unwrap();

    let live = c.assets().live();
    assert_eq!(live, vec!["icons/2".to_string()]);
    let recorded = c.store().list_assets().unwrap();
    assert_eq!(recorded.len(), 1);
    let record = locations.show(&id).unwrap().payload;
    assert_eq!(record.icon.as_deref(), Some(recorded[0].secure_url.as_str()));
    assert!(!second_path.exists());
}

#[test]
fn test_failed_icon_replacement_keeps_old_icon() {
    let tmp = TempDir::new().unwrap();
    let store = SqliteStore::open_in_memory().unwrap();
    let c = Catalog::new(store, FakeAssets::default());
    let id = c
        .resource::<Location>()
        .create(Fields::named("Barishal"), Some(upload(&tmp, "a.png").0))
        .unwrap()
        .payload
        .to_string();
    let before = c.resource::<Location>().show(&id).unwrap().payload.icon;

    // a new name that collides aborts before any upload
    create_location(&c, "Rangpur");
    let err = c
        .resource::<Location>()
        .update(&id, Fields::named("rangpur"), Some(upload(&tmp, "b.png").0))
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
    assert_eq!(c.assets().live().len(), 1);
    assert_eq!(c.resource::<Location>().show(&id).unwrap().payload.icon, before);
}

#[test]
fn test_remove_detaches_icon_and_reports_missing() {
    let tmp = TempDir::new().unwrap();
    let c = catalog(FakeAssets::default());
    let id = c
        .resource::<Generic>()
        .create(Fields::named("Metformin"), Some(upload(&tmp, "m.png").0))
        .unwrap()
        .payload
        .to_string();
    assert_eq!(c.assets().live().len(), 1);

    let reply = c.resource::<Generic>().remove(&id).unwrap();
    assert_eq!(reply.status, 200);
    assert_eq!(reply.payload.name, "Metformin");
    assert!(c.assets().live().is_empty());
    assert!(c.store().list_assets().unwrap().is_empty());

    let err = c.resource::<Generic>().remove(&id).unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
    let err = c.resource::<Generic>().remove("12345").unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[test]
fn test_detach_failure_does_not_fail_remove() {
    let tmp = TempDir::new().unwrap();
    let c = catalog(FakeAssets::failing_destroy());
    let id = c
        .resource::<Location>()
        .create(Fields::named("Mymensingh"), Some(upload(&tmp, "x.png").0))
        .unwrap()
        .payload
        .to_string();

    c.resource::<Location>().remove(&id).unwrap();
    assert!(c.resource::<Location>().show(&id).is_err());
    // the asset outlives the record but stays recorded for auditing
    assert_eq!(c.store().list_assets().unwrap().len(), 1);
}

#[test]
fn test_kinds_do_not_share_slugs() {
    let c = catalog(FakeAssets::default());
    create_location(&c, "Fresh");
    c.resource::<Generic>().create(Fields::named("Fresh"), None).unwrap();
    assert_eq!(
        c.store()
            .count(EntityKind::Generic, &Filter::slug("fresh"))
            .unwrap(),
        1
    );
}

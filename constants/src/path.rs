/// Directory under `assets/` holding the shop catalogue and its models.
pub const RELATIVE_ASSET_PATH: &str = "ar-shop";
pub const CATALOG_FILE: &str = "catalog.json";

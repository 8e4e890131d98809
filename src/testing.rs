// In-memory shop used by the unit tests in place of the HTTP client.

use crate::api::ThemeApi;
use crate::error::ApiError;
use crate::model::{Asset, NewTheme, Theme, ThemeUpdate, ROLE_MAIN};
use serde_json::Map;
use std::cell::{Cell, RefCell};

pub struct FakeShop {
    themes: RefCell<Vec<Theme>>,
    assets: RefCell<Vec<(u64, Asset)>>,
    calls: RefCell<Vec<String>>,
    next_id: Cell<u64>,
    creates_left: Cell<Option<usize>>,
}

fn not_found() -> ApiError {
    ApiError::Status {
        status: 404,
        body: r#"{"errors":"Not Found"}"#.into(),
    }
}

impl FakeShop {
    pub fn new() -> Self {
        FakeShop {
            themes: RefCell::new(Vec::new()),
            assets: RefCell::new(Vec::new()),
            calls: RefCell::new(Vec::new()),
            next_id: Cell::new(100),
            creates_left: Cell::new(None),
        }
    }

    pub fn add_theme(&self, name: &str, role: &str) -> Theme {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let theme = Theme {
            id,
            name: name.into(),
            role: role.into(),
            created_at: Some("2019-01-01T00:00:00-05:00".into()),
            updated_at: Some("2019-01-02T00:00:00-05:00".into()),
            extra: Map::new(),
        };
        self.themes.borrow_mut().push(theme.clone());
        theme
    }

    pub fn add_asset(&self, theme_id: u64, key: &str, value: &str) {
        self.store(
            theme_id,
            Asset {
                key: key.into(),
                value: Some(value.into()),
                ..Asset::default()
            },
        );
    }

    pub fn add_attachment(&self, theme_id: u64, key: &str, attachment: &str) {
        self.store(
            theme_id,
            Asset {
                key: key.into(),
                attachment: Some(attachment.into()),
                ..Asset::default()
            },
        );
    }

    fn store(&self, theme_id: u64, asset: Asset) {
        let mut assets = self.assets.borrow_mut();
        assets.retain(|(id, a)| !(*id == theme_id && a.key == asset.key));
        assets.push((theme_id, asset));
    }

    fn find_asset(&self, theme_id: u64, key: &str) -> Option<Asset> {
        self.assets
            .borrow()
            .iter()
            .find(|(id, a)| *id == theme_id && a.key == key)
            .map(|(_, a)| a.clone())
    }

    pub fn asset_value(&self, theme_id: u64, key: &str) -> Option<String> {
        self.find_asset(theme_id, key).and_then(|a| a.value)
    }

    pub fn asset_attachment(&self, theme_id: u64, key: &str) -> Option<String> {
        self.find_asset(theme_id, key).and_then(|a| a.attachment)
    }

    /// Let `n` more themes be created, then answer 422.
    pub fn fail_create_after(&self, n: usize) {
        self.creates_left.set(Some(n));
    }

    pub fn themes(&self) -> Vec<Theme> {
        self.themes.borrow().clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }
}

impl ThemeApi for FakeShop {
    fn list_themes(&self) -> Result<Vec<Theme>, ApiError> {
        self.record("list_themes".into());
        Ok(self.themes())
    }

    fn get_theme(&self, id: u64) -> Result<Theme, ApiError> {
        self.record(format!("get_theme {id}"));
        self.themes
            .borrow()
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(not_found)
    }

    fn update_theme(&self, id: u64, update: &ThemeUpdate) -> Result<Theme, ApiError> {
        self.record(format!("update {id}"));
        let mut themes = self.themes.borrow_mut();
        if update.role.as_deref() == Some(ROLE_MAIN) {
            for theme in themes.iter_mut() {
                if theme.role == ROLE_MAIN {
                    theme.role = "unpublished".into();
                }
            }
        }
        let theme = themes.iter_mut().find(|t| t.id == id).ok_or_else(not_found)?;
        if let Some(name) = &update.name {
            theme.name = name.clone();
        }
        if let Some(role) = &update.role {
            theme.role = role.clone();
        }
        Ok(theme.clone())
    }

    fn create_theme(&self, theme: &NewTheme) -> Result<Theme, ApiError> {
        self.record(format!("create {}", theme.name));
        if let Some(left) = self.creates_left.get() {
            if left == 0 {
                return Err(ApiError::Status {
                    status: 422,
                    body: r#"{"errors":{"src":["is invalid"]}}"#.into(),
                });
            }
            self.creates_left.set(Some(left - 1));
        }
        let created = self.add_theme(&theme.name, &theme.role);
        let Some(src) = &theme.src else {
            return Ok(created);
        };
        let mut themes = self.themes.borrow_mut();
        let stored = themes
            .iter_mut()
            .find(|t| t.id == created.id)
            .ok_or_else(not_found)?;
        stored.extra.insert("src".into(), src.clone().into());
        Ok(stored.clone())
    }

    fn delete_theme(&self, id: u64) -> Result<Theme, ApiError> {
        self.record(format!("delete {id}"));
        let mut themes = self.themes.borrow_mut();
        let pos = themes.iter().position(|t| t.id == id).ok_or_else(not_found)?;
        if themes[pos].role == ROLE_MAIN {
            return Err(ApiError::Status {
                status: 403,
                body: r#"{"errors":"Forbidden"}"#.into(),
            });
        }
        Ok(themes.remove(pos))
    }

    fn list_assets(&self, theme_id: u64) -> Result<Vec<Asset>, ApiError> {
        self.record(format!("list_assets {theme_id}"));
        Ok(self
            .assets
            .borrow()
            .iter()
            .filter(|(id, _)| *id == theme_id)
            .map(|(_, a)| Asset {
                key: a.key.clone(),
                ..Asset::default()
            })
            .collect())
    }

    fn get_asset(&self, theme_id: u64, key: &str) -> Result<Asset, ApiError> {
        self.record(format!("get {theme_id} {key}"));
        self.find_asset(theme_id, key).ok_or_else(not_found)
    }

    fn put_asset(&self, theme_id: u64, asset: &Asset) -> Result<Asset, ApiError> {
        self.record(format!("put {theme_id} {}", asset.key));
        if !self.themes.borrow().iter().any(|t| t.id == theme_id) {
            return Err(not_found());
        }
        self.store(theme_id, asset.clone());
        Ok(asset.clone())
    }
}

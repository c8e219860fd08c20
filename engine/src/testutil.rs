//! In-memory tenant fake for engine tests.
//!
//! Tracks every lookup and mutation so tests can assert not just on
//! decisions but on the calls that produced them (dry-run must make zero
//! mutating calls, the resolver must look a key up at most once, and so on).

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::{Value, json};

use busync_client::{ApiError, TenantApi};
use busync_types::{AppGuid, Application, BuGuid, BusinessUnit, UnitKey};

/// Call counters, for asserting remote-call behavior.
#[derive(Debug, Default, Clone, Copy)]
pub struct Counters {
    pub list_pages: u32,
    pub details: u32,
    pub updates: u32,
    pub finds: u32,
    pub creates: u32,
}

#[derive(Clone)]
struct FakeApp {
    guid: Option<String>,
    name: String,
    unit: Option<BuGuid>,
}

#[derive(Default)]
struct State {
    apps: Vec<FakeApp>,
    units: HashMap<String, BuGuid>,
    counters: Counters,
    next_unit: u32,
    failing_finds: bool,
    failing_details: HashSet<String>,
    last_update: Option<Value>,
}

#[derive(Default)]
pub struct FakeTenant {
    state: Mutex<State>,
}

impl FakeTenant {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_app(self, guid: Option<&str>, name: &str, unit: Option<&str>) -> Self {
        self.state.lock().unwrap().apps.push(FakeApp {
            guid: guid.map(str::to_string),
            name: name.to_string(),
            unit: unit.map(BuGuid::new),
        });
        self
    }

    pub fn with_unit(self, name: &str, guid: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .units
            .insert(name.to_ascii_uppercase(), BuGuid::new(guid));
        self
    }

    pub fn with_failing_finds(self) -> Self {
        self.state.lock().unwrap().failing_finds = true;
        self
    }

    pub fn with_failing_detail(self, guid: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_details
            .insert(guid.to_string());
        self
    }

    pub fn counters(&self) -> Counters {
        self.state.lock().unwrap().counters
    }

    /// Current unit assignment of an application, by guid.
    pub fn app_unit(&self, guid: &str) -> Option<BuGuid> {
        self.state
            .lock()
            .unwrap()
            .apps
            .iter()
            .find(|app| app.guid.as_deref() == Some(guid))
            .and_then(|app| app.unit.clone())
    }

    /// The profile submitted by the most recent update call.
    pub fn last_update(&self) -> Option<Value> {
        self.state.lock().unwrap().last_update.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }
}

fn injected(context: &'static str) -> ApiError {
    ApiError::Malformed {
        context,
        detail: "injected failure".to_string(),
    }
}

#[async_trait]
impl TenantApi for FakeTenant {
    async fn list_applications_page(
        &self,
        page: u32,
        size: u32,
    ) -> Result<Vec<Application>, ApiError> {
        let mut state = self.lock();
        state.counters.list_pages += 1;

        let start = (page as usize) * (size as usize);
        let end = (start + size as usize).min(state.apps.len());
        if start >= state.apps.len() {
            return Ok(Vec::new());
        }
        Ok(state.apps[start..end]
            .iter()
            .map(|app| Application {
                guid: app.guid.clone().map(AppGuid::new),
                name: app.name.clone(),
                business_unit: app.unit.clone(),
            })
            .collect())
    }

    async fn get_application(&self, guid: &AppGuid) -> Result<Value, ApiError> {
        let mut state = self.lock();
        state.counters.details += 1;

        if state.failing_details.contains(guid.as_str()) {
            return Err(injected("application detail"));
        }
        let app = state
            .apps
            .iter()
            .find(|app| app.guid.as_deref() == Some(guid.as_str()))
            .ok_or_else(|| injected("application detail"))?;

        // Carries an unrelated field so tests can prove updates preserve it.
        Ok(json!({
            "guid": guid.as_str(),
            "profile": {
                "name": app.name,
                "business_criticality": "HIGH",
                "business_unit": app.unit.as_ref().map(|u| json!({ "guid": u.as_str() })),
            }
        }))
    }

    async fn update_application(&self, guid: &AppGuid, profile: Value) -> Result<(), ApiError> {
        let mut state = self.lock();
        state.counters.updates += 1;

        let unit = profile
            .pointer("/business_unit/guid")
            .and_then(Value::as_str)
            .map(BuGuid::new);
        let slot = state
            .apps
            .iter_mut()
            .find(|app| app.guid.as_deref() == Some(guid.as_str()))
            .ok_or_else(|| injected("application update"))?;
        slot.unit = unit;
        state.last_update = Some(profile);
        Ok(())
    }

    async fn find_business_unit(
        &self,
        name: &UnitKey,
    ) -> Result<Option<BusinessUnit>, ApiError> {
        let mut state = self.lock();
        state.counters.finds += 1;

        if state.failing_finds {
            return Err(injected("business unit lookup"));
        }
        Ok(state.units.get(name.as_str()).map(|guid| BusinessUnit {
            guid: guid.clone(),
            name: name.as_str().to_string(),
        }))
    }

    async fn create_business_unit(&self, name: &UnitKey) -> Result<BusinessUnit, ApiError> {
        let mut state = self.lock();
        state.counters.creates += 1;

        state.next_unit += 1;
        let guid = BuGuid::new(format!("bu-fake-{}", state.next_unit));
        state
            .units
            .insert(name.as_str().to_string(), guid.clone());
        Ok(BusinessUnit {
            guid,
            name: name.as_str().to_string(),
        })
    }
}

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::api::types::{GeneratePayload, HistoryRecord};
use crate::api::{ApiClient, ApiError};
use crate::app::state::Action;
use crate::app::store::Store;
use crate::app::view::{begin_generate, restore_form, select_view_model, GenerateRefusal, ViewModel};
use crate::catalog::Catalog;
use crate::prompt::form::{Form, FormField};
use crate::prompt::PromptEngine;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Refused(#[from] GenerateRefusal),
    #[error(transparent)]
    Api(#[from] ApiError),
}

pub struct Session {
    store: Store,
    client: ApiClient,
    engine: PromptEngine,
    catalog: Arc<Catalog>,
    api_key: Option<String>,
    remember_key: bool,
    has_saved_key: bool,
}

impl Session {
    pub fn new(client: ApiClient, engine: PromptEngine, catalog: Arc<Catalog>) -> Self {
        Session {
            store: Store::default(),
            client,
            engine,
            catalog,
            api_key: None,
            remember_key: true,
            has_saved_key: false,
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>, remember_key: bool) -> Self {
        self.api_key = api_key.filter(|key| !key.trim().is_empty());
        self.remember_key = remember_key;
        self
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    pub fn has_saved_key(&self) -> bool {
        self.has_saved_key
    }

    pub fn view_model(&self) -> ViewModel {
        select_view_model(self.store.state(), &self.engine, &self.catalog)
    }

    pub fn update_form(&mut self, patch: Form) {
        self.store.dispatch(Action::FormUpdate(patch));
    }

    pub fn restore(&mut self, record: &HistoryRecord) -> bool {
        match restore_form(record) {
            Some(form) => {
                self.update_form(form);
                true
            }
            None => false,
        }
    }

    pub async fn init(&mut self) -> Result<(), ApiError> {
        self.store.dispatch(Action::RequestStart);
        match self.client.init().await {
            Ok(response) => {
                self.has_saved_key = response.has_saved_key;
                self.store.dispatch(Action::InitSuccess {
                    history: response.history,
                });
                Ok(())
            }
            Err(err) => {
                warn!("Init failed: {}", err);
                self.store.dispatch(Action::RequestError {
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    pub fn payload(&self, ref_image: Option<String>) -> GeneratePayload {
        let form = &self.store.state().form;
        GeneratePayload {
            api_key: self.api_key.clone(),
            remember_key: self.remember_key,
            prompt: self.engine.assemble(form, &self.catalog),
            style_tag: form.get(FormField::Style).map(str::to_string),
            aspect_ratio: form.get(FormField::AspectRatio).map(str::to_string),
            ref_image,
            metadata: form.to_metadata(),
        }
    }

    pub async fn generate(&mut self, ref_image: Option<String>) -> Result<HistoryRecord, SessionError> {
        begin_generate(
            self.store.state(),
            self.api_key.as_deref(),
            self.has_saved_key,
        )?;

        let payload = self.payload(ref_image);
        self.store.dispatch(Action::RequestStart);
        match self.client.generate(&payload).await {
            Ok(record) => {
                info!(
                    "Generation stored as {}",
                    record.url.as_deref().unwrap_or("<no url>")
                );
                self.store.dispatch(Action::GenerateSuccess {
                    record: record.clone(),
                });
                Ok(record)
            }
            Err(err) => {
                self.store.dispatch(Action::RequestError {
                    message: err.to_string(),
                });
                Err(err.into())
            }
        }
    }
}

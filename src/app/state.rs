use crate::api::types::HistoryRecord;
use crate::prompt::form::Form;

pub const UNKNOWN_ERROR: &str = "Unknown error";

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub loading: bool,
    pub error: String,
    pub history: Vec<HistoryRecord>,
    pub form: Form,
}

impl Default for AppState {
    fn default() -> Self {
        AppState {
            loading: false,
            error: String::new(),
            history: Vec::new(),
            form: Form::initial(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    InitSuccess { history: Vec<HistoryRecord> },
    FormUpdate(Form),
    RequestStart,
    RequestError { message: String },
    GenerateSuccess { record: HistoryRecord },
}

impl Action {
    pub fn kind(&self) -> &'static str {
        match self {
            Action::InitSuccess { .. } => "INIT_SUCCESS",
            Action::FormUpdate(_) => "FORM_UPDATE",
            Action::RequestStart => "REQUEST_START",
            Action::RequestError { .. } => "REQUEST_ERROR",
            Action::GenerateSuccess { .. } => "GENERATE_SUCCESS",
        }
    }
}

pub fn reducer(mut state: AppState, action: &Action) -> AppState {
    match action {
        Action::InitSuccess { history } => {
            state.loading = false;
            state.error.clear();
            state.history = history.clone();
        }
        Action::FormUpdate(patch) => {
            state.form.apply_patch(patch);
        }
        Action::RequestStart => {
            state.loading = true;
            state.error.clear();
        }
        Action::RequestError { message } => {
            state.loading = false;
            state.error = if message.is_empty() {
                UNKNOWN_ERROR.to_string()
            } else {
                message.clone()
            };
        }
        Action::GenerateSuccess { record } => {
            state.loading = false;
            state.error.clear();
            state.history.insert(0, record.clone());
        }
    }
    state
}

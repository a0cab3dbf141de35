//! Request/response DTOs for the configurator endpoint.

use serde::{Deserialize, Serialize};

use crate::application::TurnResponse;
use crate::domain::configurator::{Cart, MasterRecord};

/// POST /configurator/message request body.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    pub message: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub reset: bool,
}

/// One presented option, ranked.
#[derive(Debug, Clone, Serialize)]
pub struct OptionView {
    pub rank: usize,
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// POST /configurator/message response body.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub session_id: String,
    pub current_state: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<OptionView>>,
    pub cart: Cart,
    pub master: MasterRecord,
    pub completed: bool,
}

impl From<TurnResponse> for MessageResponse {
    fn from(turn: TurnResponse) -> Self {
        let options: Vec<OptionView> = turn
            .options
            .iter()
            .enumerate()
            .map(|(index, product)| OptionView {
                rank: index + 1,
                id: product.gin.clone(),
                name: product.name.clone(),
                description: product.description.clone(),
            })
            .collect();

        Self {
            session_id: turn.session_id.to_string(),
            current_state: turn.current_state.to_string(),
            message: turn.message,
            options: if options.is_empty() { None } else { Some(options) },
            cart: turn.cart,
            master: turn.master,
            completed: turn.completed,
        }
    }
}

/// Error body for non-200 responses.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

//! Structural validation of state updates.
//!
//! Validation is advisory: a failing state is still merged into the
//! snapshot so renderers can show what they can. The report lists missing
//! fields as dotted paths in a fixed order.

use crate::{Amount, GameOptions, StateUpdate};

/// Missing-field report for one state update.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Dotted paths such as `gameOptions.bigBlind`, in check order.
    pub missing_fields: Vec<String>,
    /// Human-readable summary enumerating `missing_fields`.
    pub message: String,
    /// The offending frame.
    pub raw_data: serde_json::Value,
}

/// Validates the `(format, variant, gameOptions)` triple of a state update.
///
/// # Errors
/// Returns a [`ValidationError`] listing every missing field.
pub fn validate_state(update: &StateUpdate) -> Result<(), ValidationError> {
    let options = update
        .game_state
        .as_ref()
        .and_then(|s| s.game_options.as_ref());
    let missing = missing_fields(
        update.format.as_deref(),
        update.variant.as_deref(),
        options,
    );

    if missing.is_empty() {
        return Ok(());
    }

    Err(ValidationError {
        message: format!(
            "game state is missing required fields: {}",
            missing.join(", ")
        ),
        missing_fields: missing,
        raw_data: update.raw.clone(),
    })
}

/// Returns the dotted paths of every missing field, in check order.
pub fn missing_fields(
    format: Option<&str>,
    variant: Option<&str>,
    options: Option<&GameOptions>,
) -> Vec<String> {
    let mut missing = Vec::new();

    if format.is_none_or(str::is_empty) {
        missing.push("format".to_string());
    }
    if variant.is_none_or(str::is_empty) {
        missing.push("variant".to_string());
    }

    let Some(options) = options else {
        missing.push("gameOptions".to_string());
        return missing;
    };

    // Blinds and buy-ins: absent or "" is missing, zero is a value.
    let amounts = [
        ("smallBlind", &options.small_blind),
        ("bigBlind", &options.big_blind),
        ("minBuyIn", &options.min_buy_in),
        ("maxBuyIn", &options.max_buy_in),
    ];
    for (name, value) in amounts {
        if value.as_ref().is_none_or(Amount::is_blank) {
            missing.push(format!("gameOptions.{name}"));
        }
    }

    // Player counts: only absent/null is missing.
    let counts = [
        ("minPlayers", &options.min_players),
        ("maxPlayers", &options.max_players),
    ];
    for (name, value) in counts {
        if value.is_none() {
            missing.push(format!("gameOptions.{name}"));
        }
    }

    missing
}

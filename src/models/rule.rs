// src/models/rule.rs

//! Per-source extraction rules for deciding availability.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// How a source's product page signals that an item can be bought.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AvailabilityRule {
    /// No sold-out marker text is present, and a purchase element exists.
    MarkerAndAction {
        /// Selector for the element that carries the sold-out text
        unavailable_selector: String,

        /// Text that marks the product as sold out
        unavailable_text: String,

        /// Selector for the purchase form or button
        action_selector: String,
    },

    /// At least one matching element is not hidden by an inline style.
    VisibleElement {
        /// Selector for the purchase buttons
        selector: String,
    },

    /// Some matching element's text contains the given label.
    ButtonLabel {
        /// Selector for candidate buttons
        selector: String,

        /// Label to look for, compared case-insensitively
        label: String,
    },
}

impl AvailabilityRule {
    /// Short name of the rule kind, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MarkerAndAction { .. } => "marker_and_action",
            Self::VisibleElement { .. } => "visible_element",
            Self::ButtonLabel { .. } => "button_label",
        }
    }

    /// Reject rules with blank fields.
    pub fn validate(&self) -> Result<()> {
        let blank = |field: &str, value: &str| {
            if value.trim().is_empty() {
                Err(AppError::validation(format!(
                    "{} rule has an empty {}",
                    self.kind(),
                    field
                )))
            } else {
                Ok(())
            }
        };

        match self {
            Self::MarkerAndAction {
                unavailable_selector,
                unavailable_text,
                action_selector,
            } => {
                blank("unavailable_selector", unavailable_selector)?;
                blank("unavailable_text", unavailable_text)?;
                blank("action_selector", action_selector)
            }
            Self::VisibleElement { selector } => blank("selector", selector),
            Self::ButtonLabel { selector, label } => {
                blank("selector", selector)?;
                blank("label", label)
            }
        }
    }
}

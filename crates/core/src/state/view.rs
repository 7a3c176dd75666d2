use serde::Serialize;

/// Generic state of one feature screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ViewState<T> {
    Initial,
    Loading,
    /// Transfer in flight, ratio in `[0, 1]`.
    Progress { ratio: f64 },
    Success { data: T, message: Option<String> },
    Error { message: String },
}

impl<T> ViewState<T> {
    /// Progress state with the ratio clamped into `[0, 1]`.
    pub fn progress(ratio: f64) -> Self {
        let ratio = if ratio.is_nan() { 0.0 } else { ratio.clamp(0.0, 1.0) };
        Self::Progress { ratio }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// `Success` or `Error` end an intent; everything else is intermediate.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success { .. } | Self::Error { .. })
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Success { data, .. } => Some(data),
            _ => None,
        }
    }
}

impl<T> Default for ViewState<T> {
    fn default() -> Self {
        Self::Initial
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_clamped() {
        assert_eq!(ViewState::<()>::progress(1.5), ViewState::Progress { ratio: 1.0 });
        assert_eq!(ViewState::<()>::progress(-0.5), ViewState::Progress { ratio: 0.0 });
        assert_eq!(ViewState::<()>::progress(f64::NAN), ViewState::Progress { ratio: 0.0 });
    }

    #[test]
    fn terminal_states() {
        assert!(ViewState::Success {
            data: 1,
            message: None
        }
        .is_terminal());
        assert!(ViewState::<u8>::error("x").is_terminal());
        assert!(!ViewState::<u8>::Loading.is_terminal());
        assert!(!ViewState::<u8>::progress(0.5).is_terminal());
    }

    #[test]
    fn data_only_on_success() {
        let state = ViewState::Success {
            data: "ok",
            message: Some("done".to_string()),
        };
        assert_eq!(state.data(), Some(&"ok"));
        assert_eq!(ViewState::<&str>::Initial.data(), None);
    }
}

use serde::Serialize;

/// Outcome of an admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed { used: u32, limit: u32 },
    Limited { used: u32, limit: u32, reset_in_seconds: u64 },
    Disabled,
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// Client-facing quota view for one prompt type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateLimitStatus {
    pub prompt_type: String,
    pub used: u32,
    pub limit: u32,
    pub remaining: u32,
    pub is_limited: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_in_seconds: Option<u64>,
    pub is_enabled: bool,
}

impl RateLimitStatus {
    /// Build the view from a display count. `reset_in_seconds` is kept only when limited.
    pub fn new(
        prompt_type: impl Into<String>,
        used: u32,
        limit: u32,
        reset_in_seconds: Option<u64>,
        is_enabled: bool,
    ) -> Self {
        let is_limited = used >= limit;

        Self {
            prompt_type: prompt_type.into(),
            used,
            limit,
            remaining: limit.saturating_sub(used),
            is_limited,
            reset_in_seconds: if is_limited { reset_in_seconds } else { None },
            is_enabled,
        }
    }
}

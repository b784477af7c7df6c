/// Errors raised while loading thresholds or evaluating a snapshot.
///
/// # Examples
///
/// ```rust
/// use sreagent_alert::error::AlertError;
///
/// let err = AlertError::UnknownBound("critical".to_string());
/// assert!(err.to_string().contains("critical"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    /// The threshold document is not valid JSON or does not match the
    /// group → metric → band shape.
    #[error("Alert: malformed threshold config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A band violates `low < design < engineered`.
    #[error(
        "Alert: thresholds for {group}.{metric} must satisfy low < design < engineered \
         (got low={low}, design={design}, engineered={engineered})"
    )]
    InvalidBand {
        group: String,
        metric: String,
        low: f64,
        design: f64,
        engineered: f64,
    },

    /// A threshold was requested that the config does not define.
    #[error("Alert: no threshold configured for {group}.{metric}.{bound}")]
    MissingThreshold {
        group: String,
        metric: String,
        bound: String,
    },

    /// A bound name other than `low`, `design` or `engineered`.
    #[error("Alert: unknown threshold bound '{0}'")]
    UnknownBound(String),

    /// A configured metric that the snapshot does not carry.
    #[error("Alert: snapshot has no metric named '{0}'")]
    UnknownMetric(String),
}

/// Convenience `Result` alias for alerting operations.
pub type Result<T> = std::result::Result<T, AlertError>;

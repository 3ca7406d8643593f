//! 配置校验模块
//!
//! 校验规则：
//! - 字段范围 (由 `validator` derive 声明)：容量 >= 1，频率在 0.001..=10000 Hz，窗口/epsilon > 0
//! - 数值必须有限 (拒绝 NaN / inf)
//! - min_distance_m < max_distance_m
//! - serial 传输需要 port，replay 传输需要 replay_path
//! - server.bind 必须是合法的 socket 地址

use std::net::SocketAddr;

use contracts::{ContractError, ImuSourceKind, StationConfig};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// 校验 StationConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &StationConfig) -> Result<(), ContractError> {
    validate_field_ranges(config)?;
    validate_finite(config)?;
    validate_distance_range(config)?;
    validate_imu_source(config)?;
    validate_server(config)?;
    Ok(())
}

/// 字段级范围校验
fn validate_field_ranges(config: &StationConfig) -> Result<(), ContractError> {
    config.validate().map_err(|errors| {
        let (field, message) = first_violation(&errors, "")
            .unwrap_or_else(|| ("<root>".to_string(), errors.to_string()));
        ContractError::config_validation(field, message)
    })
}

/// 取第一个违规字段 (按字段名排序，保证错误信息稳定)
fn first_violation(errors: &ValidationErrors, prefix: &str) -> Option<(String, String)> {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    for (field, kind) in fields {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };

        match kind {
            ValidationErrorsKind::Field(violations) => {
                if let Some(violation) = violations.first() {
                    let message = match (&violation.message, violation.params.get("value")) {
                        (Some(message), _) => message.to_string(),
                        (None, Some(value)) => {
                            format!("failed '{}' check (value: {value})", violation.code)
                        }
                        (None, None) => format!("failed '{}' check", violation.code),
                    };
                    return Some((path, message));
                }
            }
            ValidationErrorsKind::Struct(inner) => {
                if let Some(found) = first_violation(inner, &path) {
                    return Some(found);
                }
            }
            ValidationErrorsKind::List(items) => {
                for (idx, inner) in items {
                    if let Some(found) = first_violation(inner, &format!("{path}[{idx}]")) {
                        return Some(found);
                    }
                }
            }
        }
    }
    None
}

/// 浮点字段必须有限
fn validate_finite(config: &StationConfig) -> Result<(), ContractError> {
    let fields = [
        ("imu.mock_rate_hz", config.imu.mock_rate_hz),
        ("camera.frame_rate_hz", config.camera.frame_rate_hz),
        ("depth.min_distance_m", config.depth.min_distance_m),
        ("depth.max_distance_m", config.depth.max_distance_m),
        ("depth.epsilon", config.depth.epsilon),
        ("sync.window_s", config.sync.window_s),
    ];

    for (field, value) in fields {
        if !value.is_finite() {
            return Err(ContractError::config_validation(
                field,
                format!("must be a finite number, got {value}"),
            ));
        }
    }
    Ok(())
}

/// 校验距离映射区间
fn validate_distance_range(config: &StationConfig) -> Result<(), ContractError> {
    let depth = &config.depth;
    if depth.min_distance_m >= depth.max_distance_m {
        return Err(ContractError::config_validation(
            "depth.min_distance_m / depth.max_distance_m",
            format!(
                "min_distance_m ({}) must be < max_distance_m ({})",
                depth.min_distance_m, depth.max_distance_m
            ),
        ));
    }
    Ok(())
}

/// 校验 IMU 传输所需字段
fn validate_imu_source(config: &StationConfig) -> Result<(), ContractError> {
    let imu = &config.imu;
    match imu.source {
        ImuSourceKind::Serial if imu.port.trim().is_empty() => Err(
            ContractError::config_validation("imu.port", "serial source requires a port"),
        ),
        ImuSourceKind::Replay if imu.replay_path.is_none() => Err(
            ContractError::config_validation("imu.replay_path", "replay source requires a path"),
        ),
        _ => Ok(()),
    }
}

/// 校验服务地址
fn validate_server(config: &StationConfig) -> Result<(), ContractError> {
    config
        .server
        .bind
        .parse::<SocketAddr>()
        .map(|_| ())
        .map_err(|e| {
            ContractError::config_validation(
                "server.bind",
                format!("invalid socket address '{}': {e}", config.server.bind),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(validate(&StationConfig::default()).is_ok());
    }

    #[test]
    fn test_zero_history_capacity_rejected() {
        let mut config = StationConfig::default();
        config.sync.history_capacity = 0;
        let err = validate(&config).unwrap_err();
        assert!(
            err.to_string().contains("sync.history_capacity"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn test_inverted_distance_range_rejected() {
        let mut config = StationConfig::default();
        config.depth.min_distance_m = 5.0;
        config.depth.max_distance_m = 1.0;
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("min_distance_m"));
    }

    #[test]
    fn test_nan_window_rejected() {
        let mut config = StationConfig::default();
        config.sync.window_s = f64::NAN;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_serial_requires_port() {
        let mut config = StationConfig::default();
        config.imu.source = ImuSourceKind::Serial;
        config.imu.port = "  ".to_string();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("imu.port"));
    }

    #[test]
    fn test_replay_requires_path() {
        let mut config = StationConfig::default();
        config.imu.source = ImuSourceKind::Replay;
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("imu.replay_path"));
    }

    #[test]
    fn test_bad_bind_address_rejected() {
        let mut config = StationConfig::default();
        config.server.bind = "not-an-address".to_string();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("server.bind"));
    }

    #[test]
    fn test_vanishing_frame_rate_rejected() {
        let err = crate::ConfigLoader::load_from_str(
            "[camera]\nframe_rate_hz = 1e-30\n",
            crate::ConfigFormat::Toml,
        )
        .unwrap_err();
        assert!(err.to_string().contains("camera.frame_rate_hz"), "unexpected error: {err}");
    }

    #[test]
    fn test_runaway_mock_rate_rejected() {
        let mut config = StationConfig::default();
        config.imu.mock_rate_hz = 1e9;
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("imu.mock_rate_hz"));
    }

    #[test]
    fn test_jpeg_quality_out_of_range() {
        let mut config = StationConfig::default();
        config.camera.jpeg_quality = 0;
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("camera.jpeg_quality"));
    }
}

//! Configuration validation.

use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_database(config, &mut result);
        Self::validate_scheduler(config, &mut result);
        Self::validate_stream(config, &mut result);
        Self::validate_logging(config, &mut result);

        result
    }

    fn validate_database(config: &Config, result: &mut ValidationResult) {
        if config.database.path.trim().is_empty() {
            result.add_error(ValidationError::new("database.path", "Database path cannot be empty"));
        }
    }

    fn validate_scheduler(config: &Config, result: &mut ValidationResult) {
        if config.scheduler.max_pending_jobs == 0 {
            result.add_error(ValidationError::new(
                "scheduler.max_pending_jobs",
                "Max pending jobs must be greater than 0",
            ));
        }

        if !config.scheduler.recover_on_start {
            result.add_warning(ValidationWarning::new(
                "scheduler.recover_on_start",
                "Postponed messages will not be delivered after a restart until they are postponed again",
            ));
        }
    }

    fn validate_stream(config: &Config, result: &mut ValidationResult) {
        if config.stream.channel_capacity == 0 {
            result.add_error(ValidationError::new(
                "stream.channel_capacity",
                "Channel capacity must be greater than 0",
            ));
        }
    }

    fn validate_logging(config: &Config, result: &mut ValidationResult) {
        if config.logging.max_log_files == 0 {
            result.add_warning(ValidationWarning::new(
                "logging.max_log_files",
                "Rotated log files will never be pruned",
            ));
        }
    }
}

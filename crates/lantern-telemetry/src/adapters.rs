//! Domain loggers with fixed tags.
//!
//! Each adapter holds a clone of a shared [`Logger`] and turns a narrow,
//! domain-specific call into one generic [`Logger::log`] call.

use crate::{
    entry::{to_context, Context},
    level::LogLevel,
    logger::Logger,
};
use serde_json::json;
use std::time::Instant;

pub const AUTH_TAG: &str = "auth";
pub const API_TAG: &str = "api";
pub const GAME_TAG: &str = "game";
pub const PERFORMANCE_TAG: &str = "performance";

/// Operations slower than this are reported by [`PerformanceLogger::measure`]
pub const SLOW_OPERATION_MS: f64 = 5000.0;

#[derive(Clone)]
pub struct AuthLogger {
    logger: Logger,
}

impl AuthLogger {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }

    pub fn login_attempt(&self, username: &str) {
        self.log(
            LogLevel::Info,
            "Login attempt",
            json!({ "username": username }),
        );
    }

    pub fn login_success(&self, user_id: &str) {
        self.log(
            LogLevel::Info,
            "Login successful",
            json!({ "userId": user_id }),
        );
    }

    pub fn login_failure(&self, username: &str, reason: &str) {
        self.log(
            LogLevel::Warn,
            "Login failed",
            json!({ "username": username, "reason": reason }),
        );
    }

    pub fn logout(&self, user_id: &str) {
        self.log(LogLevel::Info, "User logged out", json!({ "userId": user_id }));
    }

    pub fn session_expired(&self, user_id: &str) {
        self.log(LogLevel::Warn, "Session expired", json!({ "userId": user_id }));
    }

    fn log(&self, level: LogLevel, message: &str, context: serde_json::Value) {
        self.logger
            .log(level, message, Some(AUTH_TAG), Some(&to_context(context)));
    }
}

#[derive(Clone)]
pub struct ApiLogger {
    logger: Logger,
}

impl ApiLogger {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }

    pub fn request(&self, method: &str, url: &str) {
        let context = to_context(json!({ "method": method, "url": url }));
        self.logger.log(
            LogLevel::Debug,
            &format!("{} {}", method, url),
            Some(API_TAG),
            Some(&context),
        );
    }

    /// Level follows the status class: 5xx error, 4xx warn, otherwise info
    pub fn response(&self, method: &str, url: &str, status: u16, duration_ms: f64) {
        let level = match status {
            500.. => LogLevel::Error,
            400..=499 => LogLevel::Warn,
            _ => LogLevel::Info,
        };
        let context = to_context(json!({
            "method": method,
            "url": url,
            "status": status,
            "duration": duration_ms,
        }));
        self.logger.log(
            level,
            &format!("{} {} -> {}", method, url, status),
            Some(API_TAG),
            Some(&context),
        );
    }

    pub fn api_error(&self, method: &str, url: &str, error: &dyn std::error::Error) {
        let context = to_context(json!({
            "method": method,
            "url": url,
            "error": error.to_string(),
        }));
        self.logger.log(
            LogLevel::Error,
            &format!("{} {} failed", method, url),
            Some(API_TAG),
            Some(&context),
        );
    }
}

#[derive(Clone)]
pub struct GameLogger {
    logger: Logger,
}

impl GameLogger {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }

    pub fn game_started(&self, game: &str, context: Option<&Context>) {
        let mut merged = context.cloned().unwrap_or_default();
        merged.insert("game".to_string(), json!(game));
        self.logger
            .log(LogLevel::Info, "Game started", Some(GAME_TAG), Some(&merged));
    }

    pub fn game_completed(&self, game: &str, score: i64, duration_ms: f64) {
        let context = to_context(json!({
            "game": game,
            "score": score,
            "duration": duration_ms,
        }));
        self.logger
            .log(LogLevel::Info, "Game completed", Some(GAME_TAG), Some(&context));
    }

    pub fn invalid_move(&self, game: &str, detail: &str) {
        let context = to_context(json!({ "game": game, "move": detail }));
        self.logger
            .log(LogLevel::Warn, "Invalid move", Some(GAME_TAG), Some(&context));
    }
}

#[derive(Clone)]
pub struct PerformanceLogger {
    logger: Logger,
}

impl PerformanceLogger {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }

    pub fn timing(&self, operation: &str, duration_ms: f64) {
        let context = to_context(json!({ "operation": operation, "duration": duration_ms }));
        self.logger.log(
            LogLevel::Debug,
            &format!("{} took {:.1}ms", operation, duration_ms),
            Some(PERFORMANCE_TAG),
            Some(&context),
        );
    }

    /// Time a closure, logging its duration and flagging it when slow
    pub fn measure<T>(&self, operation: &str, f: impl FnOnce() -> T) -> T {
        let started = Instant::now();
        let value = f();
        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;

        if duration_ms > SLOW_OPERATION_MS {
            self.slow_operation(operation, duration_ms, SLOW_OPERATION_MS);
        } else {
            self.timing(operation, duration_ms);
        }
        value
    }

    pub fn slow_operation(&self, operation: &str, duration_ms: f64, threshold_ms: f64) {
        let context = to_context(json!({
            "operation": operation,
            "duration": duration_ms,
            "threshold": threshold_ms,
        }));
        self.logger.log(
            LogLevel::Warn,
            &format!("Slow operation: {}", operation),
            Some(PERFORMANCE_TAG),
            Some(&context),
        );
    }
}

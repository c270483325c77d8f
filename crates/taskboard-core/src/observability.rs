//! Observability - tracing の初期化
//!
//! `RUST_LOG` があればそれを使い、空・不正・長すぎる値は無視して
//! `default_filter` にフォールバックする。出力は stderr（stdout は表示用）。

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const MAX_FILTER_LEN: usize = 4096;

/// `RUST_LOG` を解釈して EnvFilter を作る
pub fn env_filter(raw: Option<&str>, default_filter: &str) -> EnvFilter {
    raw.map(str::trim)
        .filter(|raw| !raw.is_empty() && raw.len() <= MAX_FILTER_LEN)
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .unwrap_or_else(|| EnvFilter::new(default_filter))
}

/// グローバル subscriber を登録する（2 回目以降は何もしない）
pub fn init_tracing(default_filter: &str) {
    let raw = std::env::var("RUST_LOG").ok();
    let filter = env_filter(raw.as_deref(), default_filter);

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

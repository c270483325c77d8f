//! App - アプリケーション層
//!
//! ports と view を組み合わせて、画面の裏側にある状態管理を実装する。
//!
//! # 主要コンポーネント
//! - **Shell**: セッション中のコレクションの正本と状態遷移
//! - **Config**: 設定ファイル・環境変数からのストア選択

pub mod config;
pub mod shell;

pub use self::config::{Backend, Config, ConfigError};
pub use self::shell::{Draft, Phase, Shell, ShellError, Snapshot, View};

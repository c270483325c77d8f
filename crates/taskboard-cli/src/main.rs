//! taskboard - ターミナルからコアを動かすデモ
//!
//! UI の代わりに、表・かんばん・ガントをプレーンテキストで出力する。

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};

use taskboard_core::app::{Config, Draft, Shell};
use taskboard_core::domain::{NewTask, Priority, Status, TaskId, UserId};
use taskboard_core::observability::init_tracing;
use taskboard_core::view::{SortDirection, SortKey, TableState, TaskFilter};

#[derive(Parser, Debug)]
#[command(name = "taskboard", about = "Task table, kanban board and gantt chart")]
struct Cli {
    /// 設定ファイル（なければ既定値）
    #[arg(long, global = true, env = "TASKBOARD_CONFIG", default_value = "taskboard.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// タスク一覧
    Table {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        assignee: Option<String>,
        #[arg(long)]
        status: Option<Status>,
        /// 自分の担当だけ
        #[arg(long)]
        mine: bool,
        /// 省略時は作成日時の新しい順
        #[arg(long)]
        sort: Option<SortKey>,
        /// 降順
        #[arg(long)]
        desc: bool,
    },
    /// ステータス別の列
    Board,
    /// ガントチャート
    Gantt {
        /// 今日の日付（YYYY-MM-DD、省略時はローカル日付）
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// タスクを追加
    Add {
        name: String,
        #[arg(long)]
        assignee: Option<String>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        due: Option<NaiveDate>,
        #[arg(long, default_value = "中")]
        priority: Priority,
        #[arg(long, default_value = "")]
        category: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// ステータスを変更（かんばんの列移動）
    Status { id: String, status: Status },
    /// タスクを削除
    Delete { id: String },
    /// コメント一覧
    Comments { id: String },
    /// コメントを投稿
    Comment { id: String, text: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("warn");
    let cli = Cli::parse();

    let config = Config::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?
        .from_env_overrides()?;
    let store = config.connect().context("connecting to store")?;
    let shell = Shell::new(store, config.session());
    shell.load().await?;

    run(&shell, cli.command).await
}

async fn run(shell: &Shell, command: Command) -> Result<()> {
    let today = Local::now().date_naive();
    match command {
        Command::Table {
            search,
            assignee,
            status,
            mine,
            sort,
            desc,
        } => {
            let filter = TaskFilter {
                search: search.unwrap_or_default(),
                assignee: assignee.map(UserId::new),
                status,
                mine_only: mine,
            };
            let state = table_state(sort, desc);
            print_table(shell, &filter, &state).await;
        }
        Command::Board => print_board(shell).await,
        Command::Gantt { today: at } => print_gantt(shell, at.unwrap_or(today)).await,
        Command::Add {
            name,
            assignee,
            start,
            due,
            priority,
            category,
            description,
        } => {
            let assignee = assignee
                .map(UserId::new)
                .unwrap_or_else(|| shell.session().user_id().clone());
            let start = start.unwrap_or(today);
            let fields = NewTask {
                name,
                description,
                category,
                priority,
                due_date: due.unwrap_or(start),
                ..NewTask::draft(assignee, start)
            };
            let task = shell.save(Draft::New(fields)).await?;
            println!("created {}", task.id);
        }
        Command::Status { id, status } => {
            let id = TaskId::new(id);
            if !shell.tasks().await.iter().any(|task| task.id == id) {
                anyhow::bail!("no task {id}");
            }
            match shell.move_task(&id, status).await? {
                Some(task) => println!("{} -> {}", task.id, task.status),
                None => println!("{id} is already {status}"),
            }
        }
        Command::Delete { id } => {
            let id = TaskId::new(id);
            shell.delete(&id).await?;
            println!("deleted {id}");
        }
        Command::Comments { id } => {
            let id = TaskId::new(id);
            for comment in shell.comments(&id).await? {
                println!(
                    "[{}] {}: {}",
                    comment.created_at.format("%Y-%m-%d %H:%M"),
                    comment.user_name,
                    comment.text
                );
            }
        }
        Command::Comment { id, text } => {
            let comment = shell.add_comment(&TaskId::new(id), &text).await?;
            println!("posted {}", comment.id);
        }
    }
    Ok(())
}

/// `--sort` も `--desc` もなければ既定の並び順
fn table_state(sort: Option<SortKey>, desc: bool) -> TableState {
    if sort.is_none() && !desc {
        return TableState::default();
    }
    let direction = if desc {
        SortDirection::Desc
    } else {
        SortDirection::Asc
    };
    TableState::new(sort.unwrap_or(SortKey::CreatedAt), direction)
}

async fn print_table(shell: &Shell, filter: &TaskFilter, state: &TableState) {
    let snapshot = shell.snapshot().await;
    let names = snapshot.assignee_names();
    let rows = snapshot.table(filter, state);
    println!(
        "{:<28} {:<24} {:<16} {:<6} {:<4} {:<10}  (sort: {} {:?})",
        "ID", "NAME", "ASSIGNEE", "STATUS", "PRI", "DUE", state.key, state.direction
    );
    for task in &rows {
        println!(
            "{:<28} {:<24} {:<16} {:<6} {:<4} {:<10}",
            task.id,
            task.name,
            names.display(&task.assignee),
            task.status,
            task.priority,
            task.due_date
        );
    }
    println!("{} of {} tasks", rows.len(), snapshot.tasks.len());
}

async fn print_board(shell: &Shell) {
    let snapshot = shell.snapshot().await;
    for column in snapshot.board() {
        println!("== {} ({})", column.status, column.len());
        for task in &column.tasks {
            println!("  {} {} [{}]", task.id, task.name, task.priority);
        }
    }
}

async fn print_gantt(shell: &Shell, today: NaiveDate) {
    let snapshot = shell.snapshot().await;
    let layout = snapshot.timeline(today);
    let names: Vec<&str> = layout
        .months
        .iter()
        .map(|month| month.label.as_str())
        .collect();
    println!(
        "{} .. {} ({} days) {}",
        layout.start,
        layout.end,
        layout.total_days,
        names.join(" / ")
    );

    let width = usize::try_from(layout.total_days).unwrap_or(0);
    let today_col = layout
        .today_offset
        .and_then(|offset| usize::try_from(offset).ok());
    let mut ruler: Vec<char> = vec!['.'; width];
    if let Some(col) = today_col.filter(|col| *col < width) {
        ruler[col] = '|';
    }
    println!("{:<28} {}", "", ruler.iter().collect::<String>());

    for (bar, task) in layout.bars.iter().zip(&snapshot.tasks) {
        let offset = usize::try_from(bar.offset).unwrap_or(0).min(width);
        let duration = usize::try_from(bar.duration)
            .unwrap_or(1)
            .min(width - offset);
        println!(
            "{:<28} {}{}",
            task.id,
            " ".repeat(offset),
            "#".repeat(duration)
        );
    }
}

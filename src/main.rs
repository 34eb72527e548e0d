use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use sales_ledger::config::{Config, load_config};
use sales_ledger::ledger::Ledger;
use sales_ledger::parser::{format_record, parse_daily_report};
use sales_ledger::report::{format_currency, load_daily_totals, summarize_by_month};
use sales_ledger::validator::{validate_record, validate_structure};
use std::io::Read;
use std::path::PathBuf;

const DEFAULT_LEDGER_PATH: &str = "Finance/财务跟踪表_完整版_KL.xlsx";

#[derive(Parser, Debug)]
#[command(
    name = "sales-ledger",
    version,
    about = "销售日报录入工具（解析中文日报并写入Excel台账）",
    long_about = "\
从粘贴的中文销售日报中提取各项金额并写入Excel财务跟踪表：\n\
- append：解析并校验日报文本，在'每日数据'表追加一行（含小计/合计公式与列样式）；\n\
- summary：只读模式，按月份汇总台账中的每日数据；\n\
- 台账路径解析顺序：--file > 环境变量 LEDGER_FILE > 配置文件 ledger 字段 > 默认路径。"
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 解析销售日报文本并追加到台账
    Append {
        /// 日报文本文件路径；省略时从标准输入读取
        #[arg(long, value_name = "FILE")]
        input: Option<PathBuf>,

        /// 台账Excel文件路径
        #[arg(long, value_name = "FILE")]
        file: Option<PathBuf>,

        /// JSON 配置文件路径（可选，字段均可选：ledger、backup）
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// 日期重复时仍然追加（重复日期总是新增一行，不会覆盖原行）
        #[arg(long, default_value_t = false)]
        force: bool,

        /// 保存前不创建备份
        #[arg(long, default_value_t = false)]
        no_backup: bool,

        /// 输出解析出的完整记录
        #[arg(long, default_value_t = false)]
        verbose: bool,
    },
    /// 按月份汇总台账数据（只读）
    Summary {
        /// 台账Excel文件路径
        #[arg(long, value_name = "FILE")]
        file: Option<PathBuf>,

        /// JSON 配置文件路径（可选）
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// 月份列表（如 --months 5 6 7）；省略时汇总全部月份
        #[arg(long, num_args = 0.., value_name = "M")]
        months: Vec<u32>,
    },
}

fn print_success(message: &str) {
    println!("✓ {message}");
}

fn print_warning(message: &str) {
    println!("⚠ {message}");
}

fn resolve_ledger_path(flag: Option<PathBuf>, cfg: &Config) -> PathBuf {
    if let Some(p) = flag {
        return p;
    }
    if let Ok(p) = std::env::var("LEDGER_FILE") {
        if !p.trim().is_empty() {
            return PathBuf::from(p);
        }
    }
    if let Some(p) = &cfg.ledger {
        return p.clone();
    }
    PathBuf::from(DEFAULT_LEDGER_PATH)
}

fn read_report_text(input: Option<&PathBuf>) -> Result<String> {
    match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("读取日报文件失败: {}", path.display())),
        None => {
            println!("请粘贴销售日报 (完成后按 Ctrl+D):");
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("读取标准输入失败")?;
            Ok(text)
        }
    }
}

fn run_append(
    input: Option<PathBuf>,
    file: Option<PathBuf>,
    config: Option<PathBuf>,
    force: bool,
    no_backup: bool,
    verbose: bool,
) -> Result<()> {
    let cfg = match &config {
        Some(p) => load_config(p).context("读取配置文件失败")?,
        None => Config::default(),
    };
    let ledger_path = resolve_ledger_path(file, &cfg);
    let with_backup = !no_backup && cfg.backup.unwrap_or(true);

    let text = read_report_text(input.as_ref())?;

    validate_structure(&text).map_err(|reason| anyhow::anyhow!("输入格式错误: {reason}"))?;
    print_success("输入格式正确");

    let record = parse_daily_report(&text).context("解析失败")?;
    print_success(&format!("日期: {}", record.date));
    print_success(&format!("找到 {} 个有效字段", record.non_empty_count()));

    if let Err(errors) = validate_record(&record) {
        println!("✗ 数据验证失败:");
        for error in &errors {
            println!("  - {error}");
        }
        bail!("数据验证失败，共 {} 个问题", errors.len());
    }
    print_success("数据验证通过");

    if verbose {
        println!("\n{}\n", format_record(&record));
    } else {
        let total: f64 = record.iter().filter_map(|(_, v)| v).sum();
        println!("  合计录入金额: {}", format_currency(Some(total)));
    }

    let mut ledger =
        Ledger::open(&ledger_path).with_context(|| format!("打开台账失败: {}", ledger_path.display()))?;

    if let Some(row) = ledger.check_duplicate_date(&record.date) {
        print_warning(&format!("日期 {} 已存在于第 {} 行", record.date, row));
        if !force {
            println!("操作已取消：如确认继续追加请使用 --force（不会覆盖原行）");
            return Ok(());
        }
        print_warning("已确认：将追加为新行，原行保持不变");
    } else {
        print_success("无重复日期");
    }

    if with_backup {
        let backup = ledger.create_backup().context("创建备份失败")?;
        let name = backup
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| backup.display().to_string());
        print_success(&format!("备份已创建: {name}"));
    }

    let row = ledger.insert_record(&record);
    ledger.save().context("保存台账失败")?;
    print_success(&format!("数据已插入第 {row} 行"));
    print_success("文件保存成功");
    Ok(())
}

fn run_summary(file: Option<PathBuf>, config: Option<PathBuf>, months: Vec<u32>) -> Result<()> {
    let cfg = match &config {
        Some(p) => load_config(p).context("读取配置文件失败")?,
        None => Config::default(),
    };
    let ledger_path = resolve_ledger_path(file, &cfg);

    let totals = load_daily_totals(&ledger_path)
        .with_context(|| format!("读取台账失败: {}", ledger_path.display()))?;
    let summaries = summarize_by_month(&totals);
    let summaries: Vec<_> = if months.is_empty() {
        summaries
    } else {
        summaries.into_iter().filter(|s| months.contains(&s.month)).collect()
    };

    if summaries.is_empty() {
        println!("(无数据)");
        return Ok(());
    }

    println!("{:<4} {:>4} {:>14} {:>14} {:>14} {:>12} 最高日", "月份", "天数", "场地小计", "云店小计", "营收合计", "日均营收");
    for s in &summaries {
        println!(
            "{:<4} {:>4} {:>14} {:>14} {:>14} {:>12} {} ({})",
            format!("{}月", s.month),
            s.days,
            format_currency(Some(s.venue)),
            format_currency(Some(s.store)),
            format_currency(Some(s.revenue)),
            format_currency(Some(s.revenue_mean)),
            s.peak_date,
            format_currency(Some(s.peak_revenue)),
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    match args.command {
        Command::Append { input, file, config, force, no_backup, verbose } => {
            run_append(input, file, config, force, no_backup, verbose)
        }
        Command::Summary { file, config, months } => run_summary(file, config, months),
    }
}

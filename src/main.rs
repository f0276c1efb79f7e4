//! barfilter demo - brushes a few linked bar charts over a synthetic table
//! and prints what a renderer would receive after every interaction.

use std::sync::Arc;

use anyhow::Context;
use barfilter::config::ChartConfig;
use barfilter::memory::datatile::DatatileDashboard;
use barfilter::memory::{Column, Frame};
use barfilter::selection::ChartCommand;
use barfilter::settings::Settings;
use barfilter::state::{ChartId, StrideType};
use barfilter::Crossfilter;

const ROWS: usize = 10_000;

/// Deterministic synthetic people table
fn build_frame() -> anyhow::Result<Frame> {
    let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
    let mut next = move || {
        // xorshift64
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        (seed >> 11) as f64 / (1u64 << 53) as f64
    };

    let mut age = Vec::with_capacity(ROWS);
    let mut score = Vec::with_capacity(ROWS);
    let mut member = Vec::with_capacity(ROWS);
    let mut income = Vec::with_capacity(ROWS);
    for _ in 0..ROWS {
        let a = (18.0 + next() * 62.0).floor();
        age.push(a);
        score.push((next() * 100.0).round() / 100.0);
        member.push(next() < 0.35);
        income.push(20_000.0 + a * 800.0 + next() * 15_000.0);
    }

    Ok(Frame::new()
        .with_column("age", Column::Numeric(age))?
        .with_column("score", Column::Numeric(score))?
        .with_column("member", Column::Boolean(member))?
        .with_column("income", Column::Numeric(income))?)
}

fn print_views<S, D>(session: &Crossfilter<S, D>, step: &str) -> anyhow::Result<()>
where
    S: barfilter::executor::FilterExecutor,
    D: barfilter::dashboard::Dashboard,
{
    println!("== {} ==", step);
    println!(
        "query: {}",
        match session.predicates().combined_query(None) {
            q if q.is_empty() => "<none>".to_string(),
            q => q,
        }
    );
    for view in session.views() {
        println!(
            "{} [{}] {}",
            view.id,
            session.bar_color(view.id).unwrap_or("default"),
            serde_json::to_string(&view.bins)?
        );
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let frame = Arc::new(build_frame().context("building demo frame")?);
    let mut session = Crossfilter::new(
        frame.clone(),
        DatatileDashboard::new(frame),
        Settings::load(),
    );

    let age = session.add_chart(ChartConfig::new("age").with_name("age").with_data_points(10))?;
    let score = session.add_chart(
        ChartConfig::new("score")
            .with_name("score")
            .with_step_size(0.1)
            .with_stride_type(StrideType::Float),
    )?;
    session.add_chart(ChartConfig::new("member").with_name("member"))?;
    session.add_chart(
        ChartConfig::new("age")
            .with_name("income_by_age")
            .with_y("income")
            .with_data_points(10)
            .with_interaction(false),
    )?;
    session.initialize().context("initializing charts")?;
    print_views(&session, "initial")?;

    let commands = [
        ChartCommand::RangeChange {
            chart: age.clone(),
            low: 25.0,
            high: 40.0,
        },
        ChartCommand::RangeChange {
            chart: age.clone(),
            low: 25.0,
            high: 55.0,
        },
        ChartCommand::RangeChange {
            chart: score.clone(),
            low: 0.2,
            high: 0.5,
        },
        ChartCommand::Reset { chart: age },
        ChartCommand::Reset {
            chart: ChartId::from("score"),
        },
    ];
    for command in commands {
        let label = serde_json::to_string(&command)?;
        let effects = session.handle(command)?;
        tracing::info!("{} -> {} effects", label, effects.len());
        print_views(&session, &label)?;
    }
    Ok(())
}

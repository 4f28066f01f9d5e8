//! Cron scheduler
//!
//! The global `[schedule]` runs every repository; repositories with their
//! own schedule are grouped by identical (cron, timezone) and each group
//! becomes one job. Each job sleeps until its next fire time, runs, then
//! computes the next one, so a job never overlaps itself. The config is
//! reloaded for every job run so edits take effect without a restart, while
//! the state store and summary cache stay shared across all jobs.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use chrono_tz::Tz;
use github_activity::RepositoryId;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::app::{App, RunOptions};
use crate::config::{Config, ConfigError, ScheduleConfig};
use crate::stores::SharedStores;

// ============================================================================
// Cron expressions
// ============================================================================

const DAY_NAMES: [&str; 7] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

/// A five-field crontab expression bound to a time zone
#[derive(Debug, Clone)]
pub struct CronSchedule {
    expression: String,
    /// `None` is the host's local time
    timezone: Option<Tz>,
    schedule: cron::Schedule,
}

impl CronSchedule {
    pub fn parse(expression: &str, timezone: Option<&str>) -> Result<Self, String> {
        let timezone = timezone
            .map(|name| {
                name.parse::<Tz>()
                    .map_err(|e| format!("unknown timezone '{}': {}", name, e))
            })
            .transpose()?;

        let translated = crontab_to_cron(expression)?;
        let schedule = cron::Schedule::from_str(&translated)
            .map_err(|e| format!("invalid cron expression '{}': {}", expression, e))?;

        Ok(Self {
            expression: expression.to_string(),
            timezone,
            schedule,
        })
    }

    pub fn from_config(config: &ScheduleConfig) -> Result<Self, String> {
        Self::parse(&config.cron, config.timezone.as_deref())
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn timezone_name(&self) -> &str {
        self.timezone.as_ref().map_or("local", |tz| tz.name())
    }

    /// First fire time strictly after `now`
    pub fn next_after(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self.timezone {
            Some(tz) => self
                .schedule
                .after(&now.with_timezone(&tz))
                .next()
                .map(|at| at.with_timezone(&Utc)),
            None => self
                .schedule
                .after(&now.with_timezone(&Local))
                .next()
                .map(|at| at.with_timezone(&Utc)),
        }
    }
}

/// `m h dom mon dow` to the seconds-first form with named weekdays
///
/// Crontab counts weekdays from 0 (Sunday, also 7); names avoid any
/// numbering ambiguity downstream.
fn crontab_to_cron(expression: &str) -> Result<String, String> {
    let fields: Vec<&str> = expression.split_whitespace().collect();
    let [minute, hour, day, month, weekday] = fields.as_slice() else {
        return Err(format!(
            "cron expression '{}' must have 5 fields, found {}",
            expression,
            fields.len()
        ));
    };
    let weekday = translate_weekdays(weekday)
        .map_err(|e| format!("invalid cron expression '{}': {}", expression, e))?;
    Ok(format!("0 {minute} {hour} {day} {month} {weekday}"))
}

fn translate_weekdays(field: &str) -> Result<String, String> {
    if field == "*" || field == "?" {
        return Ok(field.to_string());
    }

    let mut days = BTreeSet::new();
    for item in field.split(',') {
        let (range, step) = match item.split_once('/') {
            Some((range, step)) => {
                let step = step
                    .parse::<usize>()
                    .ok()
                    .filter(|s| *s > 0)
                    .ok_or_else(|| format!("bad weekday step '{}'", item))?;
                (range, Some(step))
            }
            None => (item, None),
        };

        let (start, end) = match range.split_once('-') {
            _ if range == "*" => (0, 6),
            Some((start, end)) => {
                let start = weekday_number(start)?;
                let end = match weekday_number(end)? {
                    // `MON-SUN`
                    0 if start > 0 => 7,
                    end => end,
                };
                (start, end)
            }
            None => {
                let day = weekday_number(range)?;
                (day, if step.is_some() { 7 } else { day })
            }
        };
        if start > end {
            return Err(format!("weekday range '{}' runs backwards", range));
        }
        for day in (start..=end).step_by(step.unwrap_or(1)) {
            days.insert(day % 7);
        }
    }

    Ok(days
        .into_iter()
        .map(|d| DAY_NAMES[d])
        .collect::<Vec<_>>()
        .join(","))
}

fn weekday_number(token: &str) -> Result<usize, String> {
    if let Ok(n) = token.parse::<usize>() {
        return if n <= 7 {
            Ok(n)
        } else {
            Err(format!("weekday {} is out of range 0-7", n))
        };
    }
    DAY_NAMES
        .iter()
        .position(|name| name.eq_ignore_ascii_case(token))
        .ok_or_else(|| format!("unknown weekday '{}'", token))
}

// ============================================================================
// Jobs
// ============================================================================

/// One scheduled run
#[derive(Debug, Clone)]
pub struct Job {
    pub name: String,
    pub schedule: CronSchedule,
    /// `None` means every configured repository
    pub repositories: Option<Vec<RepositoryId>>,
}

/// Jobs described by the configuration
pub fn plan_jobs(config: &Config) -> Result<Vec<Job>, ConfigError> {
    let parse = |schedule: &ScheduleConfig| {
        CronSchedule::from_config(schedule).map_err(ConfigError::Invalid)
    };
    let mut jobs = Vec::new();

    if let Some(schedule) = &config.schedule {
        jobs.push(Job {
            name: "all repositories".to_string(),
            schedule: parse(schedule)?,
            repositories: None,
        });
    }

    let mut groups: BTreeMap<&ScheduleConfig, Vec<RepositoryId>> = BTreeMap::new();
    for repo in &config.repositories {
        if let Some(schedule) = &repo.schedule {
            groups.entry(schedule).or_default().push(repo.name.clone());
        }
    }

    for (schedule, repos) in groups {
        let name = match repos.as_slice() {
            [single] => single.to_string(),
            many => format!("{} repositories", many.len()),
        };
        jobs.push(Job {
            name,
            schedule: parse(schedule)?,
            repositories: Some(repos),
        });
    }

    Ok(jobs)
}

pub struct Scheduler {
    config_path: PathBuf,
    jobs: Vec<Job>,
    stores: Arc<SharedStores>,
}

impl Scheduler {
    pub fn new(config_path: impl Into<PathBuf>, config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            config_path: config_path.into(),
            jobs: plan_jobs(config)?,
            stores: SharedStores::new(),
        })
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// Run every job until the future is dropped
    ///
    /// Returns immediately when nothing is scheduled.
    pub async fn run(self) {
        if self.jobs.is_empty() {
            warn!("no schedules configured");
            return;
        }

        let mut tasks = JoinSet::new();
        for job in self.jobs {
            info!(
                job = %job.name,
                cron = job.schedule.expression(),
                timezone = job.schedule.timezone_name(),
                "registered schedule"
            );
            tasks.spawn(run_job(
                self.config_path.clone(),
                job,
                self.stores.clone(),
            ));
        }
        info!(jobs = tasks.len(), "scheduler started");

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "scheduled job stopped");
            }
        }
    }
}

async fn run_job(config_path: PathBuf, job: Job, stores: Arc<SharedStores>) {
    loop {
        let now = Utc::now();
        let Some(next) = job.schedule.next_after(now) else {
            warn!(job = %job.name, "schedule has no upcoming run, stopping job");
            return;
        };
        debug!(job = %job.name, next = %next, "next scheduled run");

        let wait = (next - now).to_std().unwrap_or_default();
        tokio::time::sleep_until(Instant::now() + wait).await;

        info!(job = %job.name, "running scheduled job");
        match run_once(&config_path, &job, &stores).await {
            Ok(()) => info!(job = %job.name, "scheduled job completed"),
            Err(e) => error!(job = %job.name, error = %format!("{:#}", e), "scheduled job failed"),
        }
    }
}

async fn run_once(config_path: &Path, job: &Job, stores: &Arc<SharedStores>) -> anyhow::Result<()> {
    let app = App::load(config_path)?.with_stores(stores.clone());
    let options = RunOptions {
        repositories: job.repositories.clone(),
        ..Default::default()
    };
    let results = app.run(&options).await?;
    let failed = results.iter().filter(|r| !r.is_success()).count();
    if failed > 0 {
        warn!(job = %job.name, failed, "some repositories failed");
    }
    Ok(())
}

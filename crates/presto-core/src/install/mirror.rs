//! Registry mirror heuristic

use super::profile::PackageManager;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command as TokioCommand;
use tokio::sync::OnceCell;
use tracing::debug;

/// Alternate registry used when it is reachable faster than the default one
pub const MIRROR_REGISTRY: &str = "https://registry.npmmirror.com";

/// Node binary distribution matching [`MIRROR_REGISTRY`]
pub const MIRROR_DIST_URL: &str = "https://npmmirror.com/mirrors/node";

/// Registries the package managers use when nothing is configured
const DEFAULT_REGISTRIES: &[&str] = &["https://registry.npmjs.org", "https://registry.yarnpkg.com"];

/// Environment variable forcing the heuristic: `always`, `never` or `auto`
pub const MIRROR_ENV: &str = "PRESTO_MIRROR";

const PING_TIMEOUT: Duration = Duration::from_secs(5);

/// Decides whether installs should go through the mirror registry
#[async_trait]
pub trait MirrorPolicy: Send + Sync {
    async fn should_use_mirror(&self, package_manager: PackageManager) -> bool;
}

/// Always answers the same
#[derive(Debug, Clone, Copy)]
pub struct FixedMirrorPolicy(pub bool);

#[async_trait]
impl MirrorPolicy for FixedMirrorPolicy {
    async fn should_use_mirror(&self, _package_manager: PackageManager) -> bool {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorMode {
    Always,
    Never,
    Auto,
}

impl MirrorMode {
    pub fn from_env() -> Self {
        Self::parse(std::env::var(MIRROR_ENV).ok().as_deref())
    }

    fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("always") => MirrorMode::Always,
            Some(v) if v.eq_ignore_ascii_case("never") => MirrorMode::Never,
            _ => MirrorMode::Auto,
        }
    }
}

/// Uses the mirror only when the user kept the default registry and the
/// mirror answers faster. The decision is made once per process.
pub struct RegistryMirrorPolicy {
    mode: MirrorMode,
    client: reqwest::Client,
    decided: OnceCell<bool>,
}

impl RegistryMirrorPolicy {
    pub fn new(mode: MirrorMode, user_agent: &str) -> Self {
        Self {
            mode,
            client: reqwest::Client::builder()
                .user_agent(user_agent)
                .timeout(PING_TIMEOUT)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            decided: OnceCell::new(),
        }
    }

    pub fn from_env(user_agent: &str) -> Self {
        Self::new(MirrorMode::from_env(), user_agent)
    }

    async fn decide(&self, package_manager: PackageManager) -> bool {
        if let Some(configured) = configured_registry(package_manager).await {
            if !is_default_registry(&configured) {
                debug!(registry = %configured, "custom registry configured, skipping mirror");
                return false;
            }
        }

        let (default_latency, mirror_latency) = tokio::join!(
            self.ping(DEFAULT_REGISTRIES[0]),
            self.ping(MIRROR_REGISTRY)
        );
        debug!(?default_latency, ?mirror_latency, "pinged registries");
        mirror_is_faster(default_latency, mirror_latency)
    }

    async fn ping(&self, registry: &str) -> Option<Duration> {
        let start = Instant::now();
        match self.client.get(registry).send().await {
            Ok(resp) if resp.status().is_success() => Some(start.elapsed()),
            _ => None,
        }
    }
}

#[async_trait]
impl MirrorPolicy for RegistryMirrorPolicy {
    async fn should_use_mirror(&self, package_manager: PackageManager) -> bool {
        match self.mode {
            MirrorMode::Always => true,
            MirrorMode::Never => false,
            MirrorMode::Auto => {
                *self
                    .decided
                    .get_or_init(|| self.decide(package_manager))
                    .await
            }
        }
    }
}

/// Registry from `<pm> config get registry`, if it can be read
async fn configured_registry(package_manager: PackageManager) -> Option<String> {
    let output = TokioCommand::new(package_manager.command())
        .args(["config", "get", "registry"])
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let registry = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!registry.is_empty() && registry != "undefined").then_some(registry)
}

fn is_default_registry(registry: &str) -> bool {
    let normalized = registry.trim().trim_end_matches('/');
    DEFAULT_REGISTRIES.contains(&normalized)
}

/// Unreachable default with a reachable mirror also favors the mirror
fn mirror_is_faster(default: Option<Duration>, mirror: Option<Duration>) -> bool {
    match (default, mirror) {
        (Some(d), Some(m)) => m < d,
        (None, Some(_)) => true,
        _ => false,
    }
}

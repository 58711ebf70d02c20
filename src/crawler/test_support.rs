//! 测试用的内存浏览器会话

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::crawler::session::{PageSource, PortalPage, RevealTarget, SessionLauncher};
use crate::error::{AppError, AppResult, BrowserError};

pub const DETAIL_HTML: &str = r#"
    <html><body>
      <h3 class="tab_title">Androgen receptor modulating carboxamides</h3>
      <div class="abstract">Compounds useful in the treatment of prostate cancer.</div>
      <table><tr><td>Applicants</td><td>ORION CORPORATION</td></tr></table>
    </body></html>
"#;

pub const NATIONAL_PHASE_HTML: &str = r#"
    <html><body>
      <h3 class="tab_title">Androgen receptor modulating carboxamides</h3>
      <table class="national-phase-table">
        <tr><th>Date</th><th>Office</th><th>Number</th><th>Status</th></tr>
        <tr><td>27.04.2012</td><td>BR</td><td>BR 11 2012 008823</td><td>Granted</td></tr>
        <tr><td>26.04.2012</td><td>US</td><td>13/503,877</td><td></td></tr>
      </table>
    </body></html>
"#;

/// 一次页面访问的脚本
#[derive(Debug, Clone)]
pub struct FakeVisit {
    pub status: Result<u16, String>,
    pub html: String,
    pub revealed_html: Option<String>,
    pub latency: Duration,
}

impl FakeVisit {
    pub fn national_phase() -> Self {
        Self {
            status: Ok(200),
            html: DETAIL_HTML.to_string(),
            revealed_html: Some(NATIONAL_PHASE_HTML.to_string()),
            latency: Duration::ZERO,
        }
    }

    /// 带任意国家阶段行的页面
    pub fn with_rows(rows: &[(&str, &str, &str)]) -> Self {
        let body: String = rows
            .iter()
            .map(|(date, country, number)| {
                format!("<tr><td>{date}</td><td>{country}</td><td>{number}</td><td></td></tr>")
            })
            .collect();
        let html = format!(
            r#"<html><body><h3 class="tab_title">T</h3>
               <table class="national-phase-table"><tr><th>h</th></tr>{body}</table></body></html>"#
        );
        Self {
            status: Ok(200),
            html,
            revealed_html: None,
            latency: Duration::ZERO,
        }
    }

    pub fn blank() -> Self {
        Self {
            status: Ok(200),
            html: "<html><body><p>loading…</p></body></html>".to_string(),
            revealed_html: None,
            latency: Duration::ZERO,
        }
    }

    pub fn status(code: u16) -> Self {
        Self {
            status: Ok(code),
            ..Self::blank()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            status: Err(message.to_string()),
            ..Self::blank()
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

/// 访问计数
#[derive(Debug, Default)]
pub struct FakeStats {
    opened: AtomicUsize,
    navigations: AtomicUsize,
    pages_closed: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    visited: Mutex<Vec<String>>,
    session_closed: AtomicBool,
}

impl FakeStats {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn navigations(&self) -> usize {
        self.navigations.load(Ordering::SeqCst)
    }

    pub fn pages_closed(&self) -> usize {
        self.pages_closed.load(Ordering::SeqCst)
    }

    /// 同一会话上同时打开的页面数峰值
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }

    pub fn session_closed(&self) -> bool {
        self.session_closed.load(Ordering::SeqCst)
    }
}

/// 按脚本返回页面的会话
pub struct FakeSource {
    script: Mutex<VecDeque<FakeVisit>>,
    fallback: FakeVisit,
    stats: Arc<FakeStats>,
}

impl FakeSource {
    pub fn repeating(visit: FakeVisit) -> Self {
        Self::scripted(Vec::new(), visit)
    }

    pub fn scripted(visits: Vec<FakeVisit>, fallback: FakeVisit) -> Self {
        Self {
            script: Mutex::new(visits.into()),
            fallback,
            stats: Arc::new(FakeStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<FakeStats> {
        self.stats.clone()
    }
}

#[async_trait]
impl PageSource for FakeSource {
    async fn open(&self) -> AppResult<Box<dyn PortalPage>> {
        let visit = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        let now = self.stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.max_in_flight.fetch_max(now, Ordering::SeqCst);
        Ok(Box::new(FakePage {
            visit,
            revealed: AtomicBool::new(false),
            stats: self.stats.clone(),
        }))
    }

    async fn close(&self) -> AppResult<()> {
        self.stats.session_closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

struct FakePage {
    visit: FakeVisit,
    revealed: AtomicBool,
    stats: Arc<FakeStats>,
}

#[async_trait]
impl PortalPage for FakePage {
    async fn navigate(&self, url: &str, _timeout: Duration) -> AppResult<u16> {
        self.stats.navigations.fetch_add(1, Ordering::SeqCst);
        self.stats.visited.lock().unwrap().push(url.to_string());
        if !self.visit.latency.is_zero() {
            tokio::time::sleep(self.visit.latency).await;
        }
        self.visit.status.clone().map_err(|message| {
            AppError::Browser(BrowserError::NavigationFailed {
                url: url.to_string(),
                source: message.into(),
            })
        })
    }

    async fn reveal(&self, targets: &[RevealTarget]) -> AppResult<Option<String>> {
        if self.visit.revealed_html.is_none() {
            return Ok(None);
        }
        self.revealed.store(true, Ordering::SeqCst);
        Ok(targets.first().map(RevealTarget::describe))
    }

    async fn html(&self) -> AppResult<String> {
        match (&self.visit.revealed_html, self.revealed.load(Ordering::SeqCst)) {
            (Some(revealed), true) => Ok(revealed.clone()),
            _ => Ok(self.visit.html.clone()),
        }
    }

    async fn close(self: Box<Self>) -> AppResult<()> {
        self.stats.pages_closed.fetch_add(1, Ordering::SeqCst);
        self.stats.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

/// 按下标启动假会话，`fail_at` 指定的会话启动失败
pub struct FakeLauncher {
    pub fail_at: Option<usize>,
    pub visit: FakeVisit,
    pub launched: Mutex<Vec<Arc<FakeSource>>>,
}

impl FakeLauncher {
    pub fn new(visit: FakeVisit) -> Self {
        Self {
            fail_at: None,
            visit,
            launched: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_at(index: usize) -> Self {
        Self {
            fail_at: Some(index),
            ..Self::new(FakeVisit::blank())
        }
    }

    pub fn launched(&self) -> Vec<Arc<FakeSource>> {
        self.launched.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionLauncher for FakeLauncher {
    async fn launch(&self, index: usize) -> AppResult<Arc<dyn PageSource>> {
        if self.fail_at == Some(index) {
            return Err(AppError::Browser(BrowserError::LaunchFailed {
                source: "chrome exited".into(),
            }));
        }
        let source = Arc::new(FakeSource::repeating(self.visit.clone()));
        self.launched.lock().unwrap().push(source.clone());
        Ok(source)
    }
}

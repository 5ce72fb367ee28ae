//! Service wiring: opens storage and builds the workflow from config.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use cvup_bot::BotHandler;
use cvup_delivery::{SmtpDelivery, TemplateStore};
use cvup_issuance::IssuanceWorkflow;
use cvup_store_lmdb::{IntegrityReport, LmdbEnvironment, LmdbStore};
use cvup_verification::HttpVerificationGate;

use crate::config::DaemonConfig;
use crate::error::DaemonError;

pub type Workflow = IssuanceWorkflow<LmdbStore, HttpVerificationGate, SmtpDelivery>;

/// The running service. Created by [`App::open`], torn down by [`App::close`].
pub struct App {
    env: LmdbEnvironment,
    workflow: Arc<Workflow>,
    config: DaemonConfig,
}

impl App {
    pub fn open(config: DaemonConfig) -> Result<Self, DaemonError> {
        let env = LmdbEnvironment::open(&config.data_dir, config.map_size_bytes())?;

        let gate = HttpVerificationGate::with_timeout(
            config.gate.endpoint.clone(),
            Duration::from_secs(config.gate.timeout_secs),
        )?;

        let templates = TemplateStore::new(config.templates_dir.clone());
        for document_type in templates.missing() {
            warn!(
                %document_type,
                path = %templates.path_for(document_type).display(),
                "template missing, claims for this type will fail"
            );
        }
        if config.smtp.password.is_empty() {
            warn!("CVUP_SMTP_PASSWORD is not set, the mail relay will likely refuse to send");
        }
        let delivery = SmtpDelivery::new(&config.smtp_settings(), templates)?;

        let workflow = IssuanceWorkflow::new(Arc::new(env.store()), gate, delivery)
            .with_config(config.issuance.clone());

        info!(
            data_dir = %config.data_dir.display(),
            gate = %config.gate.endpoint,
            smtp = %config.smtp.host,
            "service ready"
        );
        Ok(Self {
            env,
            workflow: Arc::new(workflow),
            config,
        })
    }

    pub fn workflow(&self) -> &Arc<Workflow> {
        &self.workflow
    }

    pub fn store(&self) -> &LmdbStore {
        self.workflow.store()
    }

    pub fn bot(&self) -> BotHandler<LmdbStore, HttpVerificationGate, SmtpDelivery> {
        BotHandler::new(self.workflow.clone(), self.config.bot_settings())
    }

    pub fn check_integrity(&self) -> Result<IntegrityReport, DaemonError> {
        Ok(self.env.check_integrity()?)
    }

    /// Flush and close storage.
    pub fn close(self) -> Result<(), DaemonError> {
        let Self { env, workflow, .. } = self;
        drop(workflow);
        env.close()?;
        Ok(())
    }
}

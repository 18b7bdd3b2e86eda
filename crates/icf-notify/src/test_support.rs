//! Fakes and fixtures for pipeline tests.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use icf_core::entities::PushSubscription;
use icf_db::service::IcfService;
use icf_providers::{EmailMessage, EmailSender, ProviderError, PushMessage, PushSender};

use crate::{NotifySettings, Notifier};

#[derive(Default)]
pub struct FakeEmail {
    pub sent: Mutex<Vec<EmailMessage>>,
    pub reject: HashSet<String>,
}

impl FakeEmail {
    pub fn rejecting(addresses: &[&str]) -> Self {
        Self {
            sent: Mutex::default(),
            reject: addresses.iter().map(|a| (*a).to_string()).collect(),
        }
    }

    pub fn recipients(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|m| m.to.clone()).collect()
    }
}

#[async_trait]
impl EmailSender for FakeEmail {
    async fn send(&self, message: &EmailMessage) -> Result<String, ProviderError> {
        if self.reject.contains(&message.to) {
            return Err(ProviderError::Api {
                provider: "resend",
                status: 422,
                message: format!("invalid recipient {}", message.to),
            });
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(message.clone());
        Ok(format!("msg_{}", sent.len()))
    }
}

#[derive(Default)]
pub struct FakePush {
    pub delivered: Mutex<Vec<(String, PushMessage)>>,
    pub gone: HashSet<String>,
}

impl FakePush {
    pub fn with_gone(endpoints: &[&str]) -> Self {
        Self {
            delivered: Mutex::default(),
            gone: endpoints.iter().map(|e| (*e).to_string()).collect(),
        }
    }

    pub fn endpoints(&self) -> Vec<String> {
        self.delivered
            .lock()
            .unwrap()
            .iter()
            .map(|(e, _)| e.clone())
            .collect()
    }
}

#[async_trait]
impl PushSender for FakePush {
    async fn send(
        &self,
        subscription: &PushSubscription,
        message: &PushMessage,
    ) -> Result<(), ProviderError> {
        if self.gone.contains(&subscription.endpoint) {
            return Err(ProviderError::Gone(subscription.endpoint.clone()));
        }
        self.delivered
            .lock()
            .unwrap()
            .push((subscription.endpoint.clone(), message.clone()));
        Ok(())
    }
}

pub async fn test_service() -> Arc<IcfService> {
    Arc::new(IcfService::new_local(":memory:").await.unwrap())
}

pub fn settings() -> NotifySettings {
    NotifySettings {
        app_url: "https://icflog.test".into(),
        send_delay: Duration::ZERO,
        trial_warning_days: 3,
    }
}

pub fn notifier(
    svc: &Arc<IcfService>,
    email: Option<Arc<FakeEmail>>,
    push: Option<Arc<FakePush>>,
) -> Notifier {
    Notifier::new(
        Arc::clone(svc),
        email.map(|e| e as Arc<dyn EmailSender>),
        push.map(|p| p as Arc<dyn PushSender>),
        settings(),
    )
}

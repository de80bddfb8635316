//! In-memory port doubles shared by the use case tests

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::bail;
use async_trait::async_trait;

use crate::domain::{
    AppSettings, ClientCredentials, FolderHandle, RemoteFile, TokenBundle, UploadSource,
    APP_FOLDER_NAME,
};
use crate::events::{BusEvent, EventBus};
use crate::ports::{ICommandBridge, IDesktopShell, INotificationService, Notification};

pub type Hook = Box<dyn Fn(&str) + Send + Sync>;

pub fn remote(name: &str) -> RemoteFile {
    RemoteFile::new(
        format!("id-{name}"),
        name,
        format!("https://drive.google.com/file/d/id-{name}/view"),
    )
}

pub fn tokens() -> TokenBundle {
    TokenBundle {
        access_token: "ya29.access".into(),
        refresh_token: "1//refresh".into(),
        expires_in: 3599,
        token_type: "Bearer".into(),
    }
}

/// Scripted backend that records every call by name
#[derive(Default)]
pub struct MockBridge {
    pub bus: Option<Arc<EventBus>>,
    pub calls: Mutex<Vec<String>>,
    pub credentials: Mutex<Vec<ClientCredentials>>,
    pub saved_tokens: Mutex<Vec<TokenBundle>>,
    pub exchanged: Mutex<Vec<(String, String)>>,
    pub listing: Mutex<Vec<RemoteFile>>,
    pub settings: Mutex<AppSettings>,
    pub failing_uploads: Mutex<HashSet<String>>,
    pub failing_deletes: Mutex<HashSet<String>>,
    pub on_upload: Mutex<Option<Hook>>,
    pub tokens_fail: bool,
    pub exchange_fails: bool,
    pub folder_fails: bool,
    pub listing_fails: bool,
    pub logout_fails: bool,
    pub oauth_server_fails: bool,
    pub stall_uploads: bool,
}

impl MockBridge {
    pub fn with_bus(bus: &Arc<EventBus>) -> Self {
        Self {
            bus: Some(Arc::clone(bus)),
            ..Self::default()
        }
    }

    pub fn fail_upload(&self, name: &str) {
        self.failing_uploads.lock().unwrap().insert(name.to_string());
    }

    pub fn fail_delete(&self, id: &str) {
        self.failing_deletes.lock().unwrap().insert(id.to_string());
    }

    pub fn set_on_upload(&self, hook: impl Fn(&str) + Send + Sync + 'static) {
        *self.on_upload.lock().unwrap() = Some(Box::new(hook));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == name).count()
    }

    fn record(&self, name: &str) {
        self.calls.lock().unwrap().push(name.to_string());
    }

    fn transfer(&self, name: &str) -> anyhow::Result<RemoteFile> {
        if let Some(hook) = self.on_upload.lock().unwrap().as_ref() {
            hook(name);
        }
        if self.failing_uploads.lock().unwrap().contains(name) {
            bail!("quota exceeded");
        }
        if let Some(bus) = &self.bus {
            bus.publish(BusEvent::progress(name, 50));
            bus.publish(BusEvent::progress(name, 100));
        }
        Ok(remote(name))
    }
}

#[async_trait]
impl ICommandBridge for MockBridge {
    async fn get_or_create_app_folder(&self) -> anyhow::Result<FolderHandle> {
        self.record("get_or_create_app_folder");
        if self.folder_fails {
            bail!("drive unavailable");
        }
        Ok(FolderHandle::new("folder-1", APP_FOLDER_NAME))
    }

    async fn upload_file(
        &self,
        _content: &[u8],
        file_name: &str,
        _folder_id: &str,
    ) -> anyhow::Result<RemoteFile> {
        self.record("upload_file");
        if self.stall_uploads {
            std::future::pending::<()>().await;
        }
        self.transfer(file_name)
    }

    async fn upload_file_path(&self, path: &Path, _folder_id: &str) -> anyhow::Result<RemoteFile> {
        self.record("upload_file_path");
        let name = UploadSource::path(path).file_name();
        self.transfer(&name)
    }

    async fn list_recent_files(&self) -> anyhow::Result<Vec<RemoteFile>> {
        self.record("list_recent_files");
        tokio::task::yield_now().await;
        if self.listing_fails {
            bail!("network down");
        }
        Ok(self.listing.lock().unwrap().clone())
    }

    async fn delete_file(&self, file_id: &str) -> anyhow::Result<()> {
        self.record("delete_file");
        tokio::task::yield_now().await;
        if self.failing_deletes.lock().unwrap().contains(file_id) {
            bail!("permission denied");
        }
        Ok(())
    }

    async fn set_credentials(&self, credentials: &ClientCredentials) -> anyhow::Result<()> {
        self.record("set_credentials");
        self.credentials.lock().unwrap().push(credentials.clone());
        Ok(())
    }

    async fn get_tokens(&self) -> anyhow::Result<TokenBundle> {
        self.record("get_tokens");
        tokio::task::yield_now().await;
        if self.tokens_fail {
            bail!("no stored token");
        }
        Ok(tokens())
    }

    async fn exchange_auth_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> anyhow::Result<TokenBundle> {
        self.record("exchange_auth_code");
        self.exchanged
            .lock()
            .unwrap()
            .push((code.to_string(), redirect_uri.to_string()));
        if self.exchange_fails {
            bail!("invalid_grant");
        }
        Ok(tokens())
    }

    async fn save_tokens(&self, tokens: &TokenBundle) -> anyhow::Result<()> {
        self.record("save_tokens");
        self.saved_tokens.lock().unwrap().push(tokens.clone());
        Ok(())
    }

    async fn logout(&self) -> anyhow::Result<()> {
        self.record("logout");
        if self.logout_fails {
            bail!("token file locked");
        }
        Ok(())
    }

    async fn start_oauth_server(&self) -> anyhow::Result<u16> {
        self.record("start_oauth_server");
        if self.oauth_server_fails {
            bail!("address in use");
        }
        Ok(4567)
    }

    async fn load_or_create_config(&self) -> anyhow::Result<AppSettings> {
        self.record("load_or_create_config");
        Ok(self.settings.lock().unwrap().clone())
    }

    async fn save_config(&self, settings: &AppSettings) -> anyhow::Result<()> {
        self.record("save_config");
        *self.settings.lock().unwrap() = settings.clone();
        Ok(())
    }
}

/// Browser and clipboard double
#[derive(Default)]
pub struct MockShell {
    pub opened: Mutex<Vec<String>>,
    pub clipboard: Mutex<Vec<String>>,
    pub on_open: Mutex<Option<Hook>>,
    pub clipboard_fails: bool,
}

impl MockShell {
    pub fn set_on_open(&self, hook: impl Fn(&str) + Send + Sync + 'static) {
        *self.on_open.lock().unwrap() = Some(Box::new(hook));
    }

    pub fn clipboard_writes(&self) -> Vec<String> {
        self.clipboard.lock().unwrap().clone()
    }
}

#[async_trait]
impl IDesktopShell for MockShell {
    async fn open_url(&self, url: &str) -> anyhow::Result<()> {
        self.opened.lock().unwrap().push(url.to_string());
        if let Some(hook) = self.on_open.lock().unwrap().as_ref() {
            hook(url);
        }
        Ok(())
    }

    async fn write_clipboard(&self, text: &str) -> anyhow::Result<()> {
        if self.clipboard_fails {
            bail!("clipboard unavailable");
        }
        self.clipboard.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Collects every toast
#[derive(Default)]
pub struct MockNotifier {
    pub shown: Mutex<Vec<Notification>>,
}

impl MockNotifier {
    pub fn shown(&self) -> Vec<Notification> {
        self.shown.lock().unwrap().clone()
    }

    pub fn errors(&self) -> usize {
        self.shown.lock().unwrap().iter().filter(|n| n.is_error()).count()
    }
}

#[async_trait]
impl INotificationService for MockNotifier {
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()> {
        self.shown.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

/// Lets spawned timer tasks run after the clock moved
pub async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

use async_trait::async_trait;
use bytes::Bytes;

/// HID connection to a single controller.
///
/// Report ids travel separately from their payload in both directions.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn open(&self) -> std::io::Result<()>;

    async fn close(&self);

    async fn send_report(&self, report_id: u8, payload: &[u8]) -> std::io::Result<()>;

    /// Waits for the next input report. `Ok(None)` means the device is gone.
    async fn recv_report(&self) -> std::io::Result<Option<(u8, Bytes)>>;
}

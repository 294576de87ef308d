//! Per-file upload budgets and the oversize skip policy.
//!
//! Upload duration scales with payload size; connection setup and server-side
//! matching do not. One blanket timeout would be too tight for a 900 MB
//! drawing set and uselessly loose for a 40 KB memo, so each phase gets its
//! own budget and only the write budget tracks file size.

use std::time::Duration;

/// Budget for establishing the connection.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Budget reserved for server-side matching, independent of file size.
pub const READ_TIMEOUT: Duration = Duration::from_secs(120);

/// Idle budget for pooled connections.
pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(5);

const WRITE_TIMEOUT_FLOOR_SECS: u64 = 60;
const WRITE_TIMEOUT_CEILING_SECS: u64 = 600;
// Models a ~0.33 MB/s worst-case upload floor with head-room.
const WRITE_SECS_PER_MB: u64 = 3;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Per-phase timeout budgets for one upload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UploadBudgets {
    /// Connection establishment
    pub connect: Duration,
    /// Server-side processing after the upload lands
    pub read: Duration,
    /// Streaming the body, scaled to payload size
    pub write: Duration,
    /// Pooled-connection idle budget
    pub pool: Duration,
}

impl UploadBudgets {
    /// Total budget for one request: upload plus server-side processing.
    pub fn request_budget(&self) -> Duration {
        self.write + self.read
    }
}

/// Decision for one file: upload it under these budgets, or never upload it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UploadPlan {
    /// Upload with the given per-phase budgets
    Proceed(UploadBudgets),
    /// The file is never uploaded
    Skip {
        /// Human-readable reason including measured size and the limit
        reason: String,
        /// Measured file size in bytes
        size: u64,
    },
}

/// Computes the upload plan for a file from its byte size.
#[derive(Clone, Copy, Debug)]
pub struct TimeoutPlanner {
    max_file_size_mb: u64,
}

impl TimeoutPlanner {
    /// A planner with the given oversize ceiling in whole megabytes.
    pub fn new(max_file_size_mb: u64) -> Self {
        Self { max_file_size_mb }
    }

    /// Plan one upload. Files over the ceiling are skipped with a reason a
    /// person can read back; everything else gets per-phase budgets with the
    /// write budget clamped to [60s, 600s].
    pub fn plan(&self, size_bytes: u64) -> UploadPlan {
        let size_mb = size_bytes / BYTES_PER_MB;

        if size_mb > self.max_file_size_mb {
            return UploadPlan::Skip {
                reason: format!(
                    "Skipped: file is {} MB, over the {} MB limit",
                    size_mb, self.max_file_size_mb
                ),
                size: size_bytes,
            };
        }

        let write_secs = (WRITE_TIMEOUT_FLOOR_SECS + size_mb * WRITE_SECS_PER_MB)
            .clamp(WRITE_TIMEOUT_FLOOR_SECS, WRITE_TIMEOUT_CEILING_SECS);

        UploadPlan::Proceed(UploadBudgets {
            connect: CONNECT_TIMEOUT,
            read: READ_TIMEOUT,
            write: Duration::from_secs(write_secs),
            pool: POOL_IDLE_TIMEOUT,
        })
    }
}

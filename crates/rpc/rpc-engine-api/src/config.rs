/// Tunables of the Engine API handler.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum depth of the ancestor walk from the VM head towards a new
    /// payload. Ancestries deeper than this are answered `SYNCING`.
    pub parent_lookup_max_depth: u64,
    /// Maximum number of not-yet-executed blocks a single `newPayload` call
    /// is willing to run through the VM.
    pub new_payload_max_execute: u64,
    /// Disables the automatic switch to beacon sync on the first forkchoice
    /// update.
    pub disable_beacon_sync: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { parent_lookup_max_depth: 128, new_payload_max_execute: 2, disable_beacon_sync: false }
    }
}

use std::collections::BTreeMap;

/// Flags accumulated during provisioning and handed to the kubelet launch command.
///
/// The map is owned by whoever drives provisioning. Components insert the
/// entries they are responsible for and leave the rest alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KubeletFlags {
    flags: BTreeMap<String, String>,
}

impl KubeletFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a flag
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.flags.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.flags.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Format as `--key=value` arguments, sorted by key.
    pub fn to_args(&self) -> Vec<String> {
        self.flags
            .iter()
            .map(|(key, value)| format!("--{}={}", key, value))
            .collect()
    }
}

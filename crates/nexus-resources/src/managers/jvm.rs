//! JVM tuning for the Nexus container
//!
//! Nexus reads extra JVM flags from `INSTALL4J_ADD_VM_PARAMS`. The value is
//! rebuilt on every call from a local table and joined in key order, so the
//! same inputs always yield the same string.

use std::collections::BTreeMap;

use nexus_common::quantity::parse_quantity;

/// Environment variable read by the Nexus launcher
pub const JVM_PARAMS_ENV: &str = "INSTALL4J_ADD_VM_PARAMS";

const XMS: &str = "-Xms";
const XMX: &str = "-Xmx";
const MAX_DIRECT_MEMORY: &str = "-XX:MaxDirectMemorySize=";
const USER_PREFS_ROOT: &str = "-Djava.util.prefs.userRoot=";
const RANDOM_PASSWORD: &str = "-Dnexus.security.randompassword=";

const USER_PREFS_DIR: &str = "/nexus-data/javaprefs";

/// Heap size used without a memory limit
pub const DEFAULT_HEAP: &str = "1718m";
/// Direct memory size used without a memory limit
pub const DEFAULT_DIRECT_MEMORY: &str = "2148m";

const HEAP_RATIO: f64 = 0.8;
const BYTES_PER_MB: f64 = 1_000_000.0;
/// Smallest heap the JVM accepts
const MIN_HEAP_MB: f64 = 2.0;

/// Build the JVM flag string for the given memory limit.
///
/// A limit too small to size a heap from (including zero) is ignored and the
/// defaults apply.
pub fn jvm_params(memory_limit: Option<&str>, random_password: bool) -> String {
    let mut params: BTreeMap<&str, String> = BTreeMap::from([
        (XMS, DEFAULT_HEAP.to_string()),
        (XMX, DEFAULT_HEAP.to_string()),
        (MAX_DIRECT_MEMORY, DEFAULT_DIRECT_MEMORY.to_string()),
        (USER_PREFS_ROOT, USER_PREFS_DIR.to_string()),
        (RANDOM_PASSWORD, random_password.to_string()),
    ]);

    let sizes = memory_limit
        .and_then(|limit| parse_quantity(limit).ok())
        .and_then(memory_sizes);
    if let Some((heap, direct)) = sizes {
        params.extend([(XMS, heap.clone()), (XMX, heap), (MAX_DIRECT_MEMORY, direct)]);
    }

    params
        .iter()
        .map(|(flag, value)| format!("{flag}{value}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// (heap, direct memory) for a limit in bytes, as JVM size strings
fn memory_sizes(limit_bytes: f64) -> Option<(String, String)> {
    let direct_mb = (limit_bytes / BYTES_PER_MB).ceil();
    let heap_mb = (direct_mb * HEAP_RATIO).round();
    if heap_mb < MIN_HEAP_MB {
        return None;
    }
    Some((format!("{heap_mb:.0}m"), format!("{direct_mb:.0}m")))
}

// handlers/mod.rs - handler tiers
//
// Public (no auth) → Protected (JWT + profile, /api/v1/*) → Elevated (admin profile, /api/admin/*)

pub mod elevated;
pub mod protected;
pub mod public;

/// Trimmed length check used by several request validators
pub(crate) fn char_len_between(value: &str, min: usize, max: usize) -> bool {
    let len = value.trim().chars().count();
    len >= min && len <= max
}

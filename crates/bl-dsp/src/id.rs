//! Opaque identifiers for songs and tracks.
//!
//! Ids are stored inline so copying or comparing them never allocates.

use arrayvec::ArrayString;
use core::fmt::{self, Write};
use core::sync::atomic::{AtomicU64, Ordering};

/// Longest id accepted by `parse`.
pub const MAX_ID_LEN: usize = 32;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(ArrayString<MAX_ID_LEN>);

        impl $name {
            /// A fresh id, unique within this process.
            pub fn generate() -> Self {
                let n = NEXT_ID.fetch_add(1, Ordering::Relaxed);
                let mut s = ArrayString::new();
                // prefix + '-' + 16 hex digits always fits
                let _ = write!(s, concat!($prefix, "-{:016x}"), n);
                Self(s)
            }

            /// Wrap an existing id string. Empty or over-long strings are rejected.
            pub fn parse(s: &str) -> Option<Self> {
                if s.is_empty() {
                    return None;
                }
                ArrayString::from(s).ok().map(Self)
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

opaque_id! {
    /// Identifies a track across all songs.
    TrackId, "trk"
}

opaque_id! {
    /// Identifies a song.
    SongId, "song"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique_and_prefixed() {
        let a = TrackId::generate();
        let b = TrackId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("trk-"));
        assert!(SongId::generate().as_str().starts_with("song-"));
    }

    #[test]
    fn parse_round_trips_display() {
        let id = SongId::generate();
        let parsed = SongId::parse(&alloc::format!("{id}")).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn parse_rejects_empty_and_long() {
        assert!(TrackId::parse("").is_none());
        assert!(TrackId::parse(&"x".repeat(MAX_ID_LEN + 1)).is_none());
        assert_eq!(TrackId::parse("kick").unwrap().as_str(), "kick");
    }
}

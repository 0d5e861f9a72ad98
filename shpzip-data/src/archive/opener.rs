//! Opening a resolved entry pair as byte streams.

use std::io::{Read, Seek};

use log::{debug, warn};
use shpzip_core::Companion;

use super::container::{Container, EntryStream};
use super::{ArchiveError, EntryPair};

/// Owned names of a resolved pair, detached from the container's entry list.
#[derive(Debug, Clone)]
pub(crate) struct PairNames {
    pub(crate) primary: String,
    pub(crate) companion: Companion<String>,
}

impl From<EntryPair<'_>> for PairNames {
    fn from(pair: EntryPair<'_>) -> Self {
        Self {
            primary: pair.primary.name.clone(),
            companion: pair.companion.map(|entry| entry.name.clone()),
        }
    }
}

/// Open the primary entry and, when named, its companion.
///
/// A companion that exists but cannot be read is logged and reported as
/// [`Companion::Absent`].
///
/// # Errors
/// Returns [`ArchiveError::OpenEntry`] when the primary entry cannot be read.
pub(crate) fn open_pair<R: Read + Seek>(
    container: &mut Container<R>,
    names: &PairNames,
) -> Result<(EntryStream, Companion<EntryStream>), ArchiveError> {
    let primary =
        container
            .read_entry(&names.primary)
            .map_err(|source| ArchiveError::OpenEntry {
                name: names.primary.clone(),
                source,
            })?;
    let companion = match names.companion.as_ref() {
        Companion::Present(name) => match container.read_entry(name) {
            Ok(stream) => Companion::Present(stream),
            Err(err) => {
                warn!(
                    "treating companion {name:?} in {} as absent: {err}",
                    container.location()
                );
                Companion::Absent
            }
        },
        Companion::Absent => {
            debug!("opening {:?} without attributes", names.primary);
            Companion::Absent
        }
    };
    Ok((primary, companion))
}

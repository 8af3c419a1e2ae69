// SPDX-License-Identifier: Apache-2.0

use bitflags::bitflags;

bitflags! {
    /// Transport features offered by the host.
    #[derive(Default)]
    pub struct Features: u32 {
        /// Page lists are accepted. Informational, every supported host has it.
        const PHYS_PAGE_LIST = 1 << 0;

        /// Buffers may be embedded in the request block.
        const EMBEDDED_BUFFERS = 1 << 1;

        /// Single-run page lists are accepted.
        const CONTIGUOUS_PAGE_LIST = 1 << 2;

        /// Interrupt acknowledgement is fast. Informational.
        const FAST_IRQ_ACK = 1 << 31;
    }
}

/// A connection to the shared folder service.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Session {
    /// Opaque handle of the call channel, interpreted by
    /// [`Handler::dispatch`](super::Handler::dispatch).
    pub handle: usize,

    /// Client id assigned by the host on connect.
    pub client_id: u32,
}

/// Negotiated transport features and the session they were negotiated for.
///
/// Built once after connecting and immutable thereafter. All encoding decisions are pure
/// functions of the registry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Registry {
    features: Features,
    session: Session,
}

impl Registry {
    pub const fn new(features: Features, session: Session) -> Self {
        Self { features, session }
    }

    /// Builds a registry from the raw feature bits reported by the host.
    ///
    /// Unknown bits are dropped.
    pub fn from_host_features(bits: u32, session: Session) -> Self {
        Self::new(Features::from_bits_truncate(bits), session)
    }

    #[inline]
    pub fn is_enabled(&self, feature: Features) -> bool {
        self.features.contains(feature)
    }

    #[inline]
    pub fn features(&self) -> Features {
        self.features
    }

    #[inline]
    pub fn session(&self) -> &Session {
        &self.session
    }
}

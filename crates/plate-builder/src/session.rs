use std::ops::{Deref, DerefMut};

use cad_backend::{CadBackend, CadError};

/// Exclusive hold on an attached CAD backend for one build.
///
/// The document is closed exactly once: by [`CadSession::close`], or on drop
/// if `close` never ran.
pub struct CadSession<'a> {
    cad: &'a mut dyn CadBackend,
    open: bool,
}

impl<'a> CadSession<'a> {
    pub fn attach(cad: &'a mut dyn CadBackend) -> Result<Self, CadError> {
        cad.attach()?;
        Ok(Self { cad, open: true })
    }

    pub fn close(mut self) -> Result<(), CadError> {
        self.open = false;
        self.cad.close_document()
    }
}

impl<'a> Deref for CadSession<'a> {
    type Target = dyn CadBackend + 'a;

    fn deref(&self) -> &Self::Target {
        &*self.cad
    }
}

impl<'a> DerefMut for CadSession<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.cad
    }
}

impl Drop for CadSession<'_> {
    fn drop(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        if let Err(e) = self.cad.close_document() {
            tracing::warn!(error = %e, "failed to close CAD document on drop");
        }
    }
}

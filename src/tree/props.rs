use {
    crate::{
        event::{EventKind, EventMask, PropertyState},
        tree::{Atom, WindowId, WindowTree},
    },
    thiserror::Error,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PropertyMode {
    Replace,
    Prepend,
    Append,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Property {
    pub ty: Atom,
    /// 8, 16 or 32.
    pub format: u8,
    pub data: Vec<u8>,
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum PropertyError {
    #[error("Window {0} does not exist")]
    InvalidWindow(WindowId),
    #[error("Property format {0} is invalid")]
    InvalidFormat(u8),
    #[error("The data length {0} is not a multiple of the format")]
    InvalidLength(usize),
    #[error("Cannot prepend or append to a property with a different type or format")]
    Mismatch,
}

impl WindowTree {
    pub fn change_property(
        &mut self,
        id: WindowId,
        atom: Atom,
        ty: Atom,
        format: u8,
        mode: PropertyMode,
        data: &[u8],
    ) -> Result<(), PropertyError> {
        let idx = self.idx(id).ok_or(PropertyError::InvalidWindow(id))?;
        if !matches!(format, 8 | 16 | 32) {
            return Err(PropertyError::InvalidFormat(format));
        }
        if data.len() % (format as usize / 8) != 0 {
            return Err(PropertyError::InvalidLength(data.len()));
        }
        let w = self.w_mut(idx);
        match w.properties.get_mut(&atom) {
            Some(prop) if mode != PropertyMode::Replace => {
                if prop.ty != ty || prop.format != format {
                    return Err(PropertyError::Mismatch);
                }
                match mode {
                    PropertyMode::Prepend => {
                        prop.data.splice(0..0, data.iter().copied());
                    }
                    _ => prop.data.extend_from_slice(data),
                }
            }
            _ => {
                w.properties.insert(
                    atom,
                    Property {
                        ty,
                        format,
                        data: data.to_vec(),
                    },
                );
            }
        }
        if atom == Atom::WM_NAME {
            let title = match self.w(idx).properties.get(&atom) {
                Some(prop) => prop.data.clone(),
                None => vec![],
            };
            self.set_title_idx(idx, &title);
        }
        self.property_notify(idx, atom, PropertyState::NewValue);
        Ok(())
    }

    /// Returns a copy of the property and deletes it if `delete` is set.
    pub fn get_property(&mut self, id: WindowId, atom: Atom, delete: bool) -> Option<Property> {
        let idx = self.idx(id)?;
        let prop = self.w(idx).properties.get(&atom).cloned()?;
        if delete {
            self.delete_property(id, atom);
        }
        Some(prop)
    }

    pub fn delete_property(&mut self, id: WindowId, atom: Atom) {
        let Some(idx) = self.idx(id) else {
            return;
        };
        if self.w_mut(idx).properties.remove(&atom).is_none() {
            return;
        }
        if atom == Atom::WM_NAME {
            self.set_title_idx(idx, b"");
        }
        self.property_notify(idx, atom, PropertyState::Deleted);
    }

    pub fn list_properties(&self, id: WindowId) -> Vec<Atom> {
        let Some(w) = self.window(id) else {
            return vec![];
        };
        let mut atoms: Vec<_> = w.properties.keys().copied().collect();
        atoms.sort();
        atoms
    }

    fn property_notify(&mut self, idx: u32, atom: Atom, state: PropertyState) {
        let kind = EventKind::PropertyNotify {
            atom,
            state,
            time: self.time,
        };
        self.deliver(idx, EventMask::PROPERTY_CHANGE, &kind);
    }
}

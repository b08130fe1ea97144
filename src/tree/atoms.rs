use {
    ahash::AHashMap,
    bstr::{BStr, BString, ByteSlice},
    std::fmt::{Display, Formatter},
};

/// An interned string.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Atom(u32);

impl Atom {
    pub const WM_NAME: Self = Atom(1);
    pub const WM_PROTOCOLS: Self = Atom(2);
    pub const WM_DELETE_WINDOW: Self = Atom(3);
    pub const WM_TRANSIENT_FOR: Self = Atom(4);
    pub const STRING: Self = Atom(5);
    pub const UTF8_STRING: Self = Atom(6);

    pub fn raw(self) -> u32 {
        self.0
    }
}

impl Display for Atom {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

const PREDEFINED: [&str; 6] = [
    "WM_NAME",
    "WM_PROTOCOLS",
    "WM_DELETE_WINDOW",
    "WM_TRANSIENT_FOR",
    "STRING",
    "UTF8_STRING",
];

pub struct AtomTable {
    by_name: AHashMap<BString, Atom>,
    names: Vec<BString>,
}

impl Default for AtomTable {
    fn default() -> Self {
        let mut slf = Self {
            by_name: Default::default(),
            names: vec![BString::default()],
        };
        for name in PREDEFINED {
            slf.intern(name.as_bytes(), false);
        }
        slf
    }
}

impl AtomTable {
    /// Returns the atom for `name`, creating it unless `only_if_exists` is
    /// set.
    pub fn intern(&mut self, name: &[u8], only_if_exists: bool) -> Option<Atom> {
        if let Some(atom) = self.by_name.get(name.as_bstr()) {
            return Some(*atom);
        }
        if only_if_exists {
            return None;
        }
        let atom = Atom(self.names.len() as u32);
        self.names.push(name.into());
        self.by_name.insert(name.into(), atom);
        Some(atom)
    }

    pub fn name(&self, atom: Atom) -> Option<&BStr> {
        if atom.0 == 0 {
            return None;
        }
        self.names.get(atom.0 as usize).map(|n| n.as_bstr())
    }
}

macro_rules! linear_ids {
    ($ids:ident, $id:ident, $ty:ty) => {
        pub struct $ids {
            next: std::sync::atomic::AtomicU64,
        }

        impl Default for $ids {
            fn default() -> Self {
                Self {
                    next: std::sync::atomic::AtomicU64::new(1),
                }
            }
        }

        impl $ids {
            pub fn next(&self) -> $id {
                $id(self.next.fetch_add(1, std::sync::atomic::Ordering::Relaxed) as $ty)
            }
        }

        #[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
        pub struct $id($ty);

        #[allow(dead_code)]
        impl $id {
            pub const NONE: Self = $id(0);

            pub fn raw(self) -> $ty {
                self.0
            }

            pub fn from_raw(raw: $ty) -> Self {
                Self(raw)
            }

            pub fn is_none(self) -> bool {
                self.0 == 0
            }
        }

        impl std::fmt::Display for $id {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

macro_rules! bitflags {
    ($(#[$attr:meta])* $name:ident: $ty:ty; $($(#[$fattr:meta])* $flag:ident = $val:expr,)*) => {
        $(#[$attr])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
        pub struct $name(pub $ty);

        #[allow(dead_code)]
        impl $name {
            $(
                $(#[$fattr])*
                pub const $flag: Self = Self($val);
            )*

            pub const NONE: Self = Self(0);

            pub const fn all() -> Self {
                Self(0 $(| $val)*)
            }

            pub fn contains(self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }

            pub fn intersects(self, other: Self) -> bool {
                self.0 & other.0 != 0
            }

            pub fn is_empty(self) -> bool {
                self.0 == 0
            }
        }

        impl std::ops::BitOr for $name {
            type Output = Self;

            fn bitor(self, rhs: Self) -> Self {
                Self(self.0 | rhs.0)
            }
        }

        impl std::ops::BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: Self) {
                self.0 |= rhs.0;
            }
        }

        impl std::ops::BitAnd for $name {
            type Output = Self;

            fn bitand(self, rhs: Self) -> Self {
                Self(self.0 & rhs.0)
            }
        }

        impl std::ops::Not for $name {
            type Output = Self;

            fn not(self) -> Self {
                Self(!self.0)
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let mut first = true;
                write!(f, "{}(", stringify!($name))?;
                $(
                    if self.contains(Self::$flag) && Self::$flag.0 != 0 {
                        if !first {
                            f.write_str(" | ")?;
                        }
                        first = false;
                        f.write_str(stringify!($flag))?;
                    }
                )*
                let _ = first;
                f.write_str(")")
            }
        }
    };
}

//! Declarative wiring of configuration types into the binding tree.

/// Implement [`Shape`](crate::Shape) for a configuration type and generate a
/// typed accessor trait for [`Node`](crate::Node)s of that type.
///
/// Every leaf in `fields` gets a getter that reloads before reading and a
/// setter that persists after writing; field types must be `Clone`. Every
/// entry in `sections` is a nested configuration type with its own binding
/// and accessor trait, reachable through a method returning its `Node`.
///
/// Fields and sections must not be named after an inherent method of
/// [`Node`](crate::Node) (`get`, `set`, `section`, `snapshot`, `path`,
/// `config`): the inherent method takes precedence in method-call syntax, so
/// the generated accessor would only be reachable as
/// `AccessTrait::name(&node)`.
///
/// ```rust
/// use livecfg::{MemoryStore, SourceSet, config_shape};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Default, Serialize, Deserialize)]
/// struct Pool {
///     size: u32,
/// }
///
/// #[derive(Debug, Clone, Default, Serialize, Deserialize)]
/// struct Database {
///     url: String,
///     pool: Pool,
/// }
///
/// config_shape! {
///     trait PoolAccess for Pool {
///         fields { size / set_size: u32 }
///     }
/// }
///
/// config_shape! {
///     trait DatabaseAccess for Database {
///         fields { url / set_url: String }
///         sections { pool: Pool }
///     }
/// }
///
/// let store = MemoryStore::new("db");
/// let db = livecfg::setup_with(SourceSet::single(store.clone()), Database::default).unwrap();
///
/// db.pool().unwrap().set_size(16).unwrap();
/// assert!(store.text().unwrap().contains("size = 16"));
/// ```
#[macro_export]
macro_rules! config_shape {
    (
        $vis:vis trait $access:ident for $ty:ty {
            $( fields { $( $field:ident / $setter:ident : $fty:ty ),* $(,)? } )?
            $( sections { $( $section:ident : $sty:ty ),* $(,)? } )?
        }
    ) => {
        impl $crate::Shape for $ty {
            fn sections<R: $crate::Shape>(
                sections: &mut $crate::Sections<'_, R, Self>,
            ) -> ::std::result::Result<(), $crate::ConfigError> {
                $($(
                    sections.section($crate::Field::<$ty, $sty>::new(
                        ::std::stringify!($section),
                        |parent| &parent.$section,
                        |parent| &mut parent.$section,
                    ))?;
                )*)?
                let _ = sections;
                ::std::result::Result::Ok(())
            }
        }

        $vis trait $access<R> {
            $($(
                fn $field(&self) -> ::std::result::Result<$fty, $crate::ConfigError>;

                fn $setter(&self, value: $fty) -> ::std::result::Result<(), $crate::ConfigError>;
            )*)?
            $($(
                fn $section(&self) -> ::std::result::Result<$crate::Node<R, $sty>, $crate::ConfigError>;
            )*)?
        }

        impl<R: $crate::Shape> $access<R> for $crate::Node<R, $ty> {
            $($(
                fn $field(&self) -> ::std::result::Result<$fty, $crate::ConfigError> {
                    self.get(|object| ::std::clone::Clone::clone(&object.$field))
                }

                fn $setter(&self, value: $fty) -> ::std::result::Result<(), $crate::ConfigError> {
                    self.set(move |object| object.$field = value)
                }
            )*)?
            $($(
                fn $section(&self) -> ::std::result::Result<$crate::Node<R, $sty>, $crate::ConfigError> {
                    self.section($crate::Field::<$ty, $sty>::new(
                        ::std::stringify!($section),
                        |parent| &parent.$section,
                        |parent| &mut parent.$section,
                    ))
                }
            )*)?
        }
    };
}

/// Configuration macros for zero-repetition config definitions
///
/// `config_struct!` declares a configuration structure with its defaults
/// embedded next to each field, so the struct, its `Default` impl and its
/// serde support never drift apart.

/// Define a configuration struct with embedded defaults
///
/// # Example
/// ```
/// supplyscan::config_struct! {
///     pub struct SchedulerConfig {
///         batch_size: usize = 5,
///         batch_delay_ms: u64 = 200,
///     }
/// }
///
/// let cfg = SchedulerConfig::default();
/// assert_eq!(cfg.batch_size, 5);
/// ```
///
/// Generated items:
/// - A struct with public fields
/// - A Default implementation with the specified values
/// - Serde support with `#[serde(default)]`, so partial TOML files are accepted
#[macro_export]
macro_rules! config_struct {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_name:ident: $field_type:ty = $default_value:expr
            ),*
            $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        #[serde(default)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                pub $field_name: $field_type,
            )*
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    $(
                        $field_name: $default_value,
                    )*
                }
            }
        }
    };
}

use std::{path::PathBuf, sync::LazyLock};

pub static DEFAULT_HKMM_PATH: LazyLock<PathBuf> = LazyLock::new(|| {
    if std::env::var("HKMM_HOME_PATH").is_ok() {
        let mut path = dirs::home_dir().unwrap_or_default();
        path.push("hkmm");
        return path;
    }

    let mut path = dirs::config_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_default();
    path.push("hkmm");
    path
});

/// Computes a path under the hkmm config directory.
///
/// Returns a `&Path` referencing the config directory itself if no arguments are passed in, or a
/// `PathBuf` created by joining all of the arguments to the base config directory if at least
/// one argument is passed in.
///
/// # Examples
///
/// ```
/// // With `HKMM_HOME_PATH` unset the base is `<config dir>/hkmm`
/// let logs = hkmm::hkmm_path!("logs");
/// assert!(logs.ends_with("hkmm/logs"));
/// ```
#[macro_export]
macro_rules! hkmm_path {
    () => {
        $crate::paths::DEFAULT_HKMM_PATH.as_path()
    };

    ( $( $path:expr ),+ $(,)? ) => {
        [
            $crate::paths::DEFAULT_HKMM_PATH.as_path(),
            $( std::path::Path::new(&$path) ),+
        ].into_iter().collect::<std::path::PathBuf>()
    };
}

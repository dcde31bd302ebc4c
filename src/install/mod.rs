//! On-disk side of installed bundles: layout, shortcuts, menu, state, launch.

pub mod launch;
pub mod layout;
pub mod menu;
pub mod shortcut;
pub mod state;

pub use launch::{LaunchError, launch};
pub use layout::InstallLayout;
pub use menu::{MenuError, MenuIntegration, NoMenu, XdgDesktopMenu};
pub use state::{InstalledState, has_update, installed_version, is_installed, resolve};

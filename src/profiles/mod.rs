//! Installation profiles.
//!
//! A profile selects the package set handed to `pacstrap`, the display
//! manager enabled during system configuration, and which post-configuration
//! variant runs once the system boots on its own. Package lists and desktop
//! settings live here as static tables so they are easy to update and can be
//! checked without running the installer.
//!
//! # Profiles
//!
//! | Profile   | Description                 | Display Manager |
//! |-----------|-----------------------------|-----------------|
//! | Beginner  | Cinnamon desktop            | lightdm         |
//! | Suckless  | dwm, st, dmenu from source  | None (startx)   |
//! | Expert    | Reserved                    | -               |

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Installation level picked from the first menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(EnumIter, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InstallProfile {
    /// Cinnamon desktop with a graphical login.
    Beginner,
    /// dwm, st and dmenu built from source, autologin into X.
    Suckless,
    /// Not implemented yet; selecting it ends the run.
    Expert,
}

impl InstallProfile {
    /// Line shown in the profile menu.
    pub fn menu_label(self) -> &'static str {
        match self {
            Self::Beginner => "Beginner (Cinnamon desktop - perfect for starters)",
            Self::Suckless => "Tony-Suckless (dwm + minimal setup)",
            Self::Expert => "Expert (Coming soon...)",
        }
    }

    /// Whether the pipeline can install this profile.
    pub fn is_installable(self) -> bool {
        !matches!(self, Self::Expert)
    }

    /// Packages passed to `pacstrap`.
    pub fn packages(self) -> &'static [&'static str] {
        match self {
            Self::Beginner => CINNAMON_PACKAGES,
            Self::Suckless => SUCKLESS_PACKAGES,
            Self::Expert => &[],
        }
    }

    /// Service name of the display manager, if the profile has one.
    pub fn display_manager(self) -> Option<&'static str> {
        match self {
            Self::Beginner => Some("lightdm"),
            Self::Suckless | Self::Expert => None,
        }
    }

    /// Services enabled for every profile.
    pub fn services(self) -> &'static [&'static str] {
        &["NetworkManager"]
    }
}

const CINNAMON_PACKAGES: &[&str] = &[
    // Base system
    "base",
    "base-devel",
    "linux",
    "linux-firmware",
    "linux-headers",
    "networkmanager",
    // CLI tools
    "git",
    "vim",
    "neovim",
    "curl",
    "wget",
    "htop",
    "btop",
    "man-db",
    "man-pages",
    "openssh",
    "sudo",
    // Desktop
    "cinnamon",
    "cinnamon-translations",
    "nemo",
    "nemo-fileroller",
    "gnome-terminal",
    // Display manager
    "lightdm",
    "lightdm-gtk-greeter",
    // Applications
    "file-roller",
    "firefox",
    "alacritty",
    "vlc",
    "evince",
    "eog",
    "gedit",
];

const SUCKLESS_PACKAGES: &[&str] = &[
    // Base system
    "base",
    "base-devel",
    "linux",
    "linux-firmware",
    "linux-headers",
    "networkmanager",
    // CLI tools
    "git",
    "vim",
    "neovim",
    "curl",
    "wget",
    "htop",
    "man-db",
    "man-pages",
    "openssh",
    "sudo",
    // X11 and build deps for dwm/st/dmenu
    "xorg-server",
    "xorg-xinit",
    "xorg-xsetroot",
    "xorg-xrandr",
    "libx11",
    "libxft",
    "libxinerama",
    // Desktop utilities
    "firefox",
    "picom",
    "xclip",
    "xwallpaper",
    "ttf-jetbrains-mono-nerd",
    "slock",
    "maim",
    "rofi",
    // Audio
    "alsa-utils",
    "pulseaudio",
    "pulseaudio-alsa",
    "pavucontrol",
];

/// Where the wallpaper is installed inside the target.
pub const WALLPAPER_DIR: &str = "/usr/share/wallpapers";
/// Wallpaper file name, shared by both desktop profiles.
pub const WALLPAPER_FILE: &str = "wall1.jpg";

/// Absolute path of the wallpaper as seen from the installed system.
pub fn wallpaper_path() -> String {
    format!("{}/{}", WALLPAPER_DIR, WALLPAPER_FILE)
}

/// A source tree cloned and built for the Suckless profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRepo {
    pub name: &'static str,
    pub url: &'static str,
}

impl SourceRepo {
    /// Clone destination in the user's home.
    pub fn checkout_dir(&self, username: &str) -> String {
        format!("/home/{}/{}", username, self.name)
    }
}

/// dwm, st and dmenu, in build order.
pub const SUCKLESS_REPOS: &[SourceRepo] = &[
    SourceRepo { name: "dwm", url: "https://github.com/tonybanters/dwm" },
    SourceRepo { name: "st", url: "https://github.com/tonybanters/st" },
    SourceRepo { name: "dmenu", url: "https://github.com/tonybanters/dmenu" },
];

/// A file written into the user's home for the Suckless profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dotfile {
    pub name: &'static str,
    pub contents: &'static str,
    pub mode: u32,
}

pub const SUCKLESS_DOTFILES: &[Dotfile] = &[
    Dotfile {
        name: ".xinitrc",
        contents: "xwallpaper --zoom /usr/share/wallpapers/wall1.jpg &\nexec dwm\n",
        mode: 0o755,
    },
    Dotfile {
        name: ".bash_profile",
        contents: "if [ -z $DISPLAY ] && [ $XDG_VTNR = 1 ]; then\n  exec startx\nfi\n",
        mode: 0o644,
    },
];

/// systemd drop-in enabling console autologin of `username` on tty1.
pub fn autologin_override(username: &str) -> String {
    format!(
        "[Service]\nExecStart=\nExecStart=-/sbin/agetty -o \"-p -f -- \\\\u\" --noclear --autologin {} %I $TERM\n",
        username
    )
}

const KEYBINDINGS: &str = "/org/cinnamon/desktop/keybindings";
const CUSTOM: &str = "/org/cinnamon/desktop/keybindings/custom-keybindings";

/// `(key, GVariant value)` pairs written with `dconf write` for Beginner.
pub fn cinnamon_settings() -> Vec<(String, String)> {
    let launchers = [
        ("custom0", "<Super>Return", "alacritty", "Terminal"),
        ("custom1", "<Super>b", "firefox", "Browser"),
        ("custom2", "<Super>e", "nemo", "File Manager"),
    ];

    let mut settings = Vec::with_capacity(16);
    for (slot, binding, command, name) in launchers {
        settings.push((format!("{}/{}/binding", CUSTOM, slot), format!("['{}']", binding)));
        settings.push((format!("{}/{}/command", CUSTOM, slot), format!("'{}'", command)));
        settings.push((format!("{}/{}/name", CUSTOM, slot), format!("'{}'", name)));
    }
    settings.push((
        format!("{}/custom-list", KEYBINDINGS),
        "['custom0', 'custom1', 'custom2']".to_string(),
    ));

    let wm = [
        ("close", "['<Super>q', '<Alt>F4']"),
        ("toggle-fullscreen", "['<Super>f']"),
        ("push-tile-left", "['<Super>Left']"),
        ("push-tile-right", "['<Super>Right']"),
    ];
    for (action, value) in wm {
        settings.push((format!("{}/wm/{}", KEYBINDINGS, action), value.to_string()));
    }

    settings.push((
        "/org/cinnamon/desktop/background/picture-uri".to_string(),
        format!("'file://{}'", wallpaper_path()),
    ));
    settings.push((
        "/org/cinnamon/desktop/background/picture-options".to_string(),
        "'zoom'".to_string(),
    ));
    settings
}

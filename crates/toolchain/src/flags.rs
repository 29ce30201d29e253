//! Compiler, assembler and linker flag sets per board.
//!
//! [`build_flags`] is a pure function: the same board, defines and host give
//! the same [`FrameworkConfig`], independent of call order. Rules are applied
//! in a fixed sequence:
//!
//! ```text
//! USB mode default → framework defines/paths → core flags (AVR | Cortex-M)
//!   → [Cortex-M] RTC time, printf float, linker script, FPU, optimization/LTO
//!   → CPU quirks (cortex-m0/m4) → core include/library paths → library sources
//! ```

use std::path::{Path, PathBuf};

use board::{BoardConfig, HostSystem};
use serde::Serialize;

use crate::{BuildContext, Define, ToolchainError};

/// Package holding the Teensy cores and variants.
pub const FRAMEWORK_PACKAGE: &str = "framework-arduinoteensy-ts";

/// Package holding the Teensyduino libraries.
pub const FRAMEWORK_LIBS_PACKAGE: &str = "framework-arduinoteensy";

/// Arduino API level advertised through `-DARDUINO`.
pub const ARDUINO_VERSION: u32 = 10819;

/// USB modes selectable through a define. Without one, `USB_SERIAL` is used.
pub const BUILTIN_USB_FLAGS: &[&str] = &[
    "USB_SERIAL",
    "USB_DUAL_SERIAL",
    "USB_TRIPLE_SERIAL",
    "USB_KEYBOARDONLY",
    "USB_TOUCHSCREEN",
    "USB_HID_TOUCHSCREEN",
    "USB_HID",
    "USB_SERIAL_HID",
    "USB_MIDI",
    "USB_MIDI4",
    "USB_MIDI16",
    "USB_MIDI_SERIAL",
    "USB_MIDI4_SERIAL",
    "USB_MIDI16_SERIAL",
    "USB_AUDIO",
    "USB_MIDI_AUDIO_SERIAL",
    "USB_MIDI16_AUDIO_SERIAL",
    "USB_MTPDISK",
    "USB_RAWHID",
    "USB_FLIGHTSIM",
    "USB_FLIGHTSIM_JOYSTICK",
    "USB_EVERYTHING",
    "USB_DISABLED",
    "USB_MTPDISK_SERIAL",
];

/// Boards with a hardware FPU.
const FPU_BOARDS: &[&str] = &["teensy35", "teensy36", "teensy40", "teensy41", "teensymm"];

// ── Optimization profiles ───────────────────────────────────────────────────

/// Optimization profile selected with a `TEENSY_OPT_*` define.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OptimizationProfile {
    /// `TEENSY_OPT_FASTER_LTO`
    FasterLto,
    /// `TEENSY_OPT_FAST`
    Fast,
    /// `TEENSY_OPT_FAST_LTO`
    FastLto,
    /// `TEENSY_OPT_FASTEST`
    Fastest,
    /// `TEENSY_OPT_FASTEST_LTO`
    FastestLto,
    /// `TEENSY_OPT_FASTEST_PURE_CODE`
    FastestPureCode,
    /// `TEENSY_OPT_FASTEST_PURE_CODE_LTO`
    FastestPureCodeLto,
    /// `TEENSY_OPT_DEBUG`
    Debug,
    /// `TEENSY_OPT_DEBUG_LTO`
    DebugLto,
    /// `TEENSY_OPT_SMALLEST_CODE_LTO`
    SmallestCodeLto,
    /// `TEENSY_OPT_FASTER`
    Faster,
    /// `TEENSY_OPT_SMALLEST_CODE`
    SmallestCode,
}

impl OptimizationProfile {
    /// Every profile, in selection priority order.
    pub const ALL: [Self; 12] = [
        Self::FasterLto,
        Self::Fast,
        Self::FastLto,
        Self::Fastest,
        Self::FastestLto,
        Self::FastestPureCode,
        Self::FastestPureCodeLto,
        Self::Debug,
        Self::DebugLto,
        Self::SmallestCodeLto,
        Self::Faster,
        Self::SmallestCode,
    ];

    /// The define that selects this profile.
    #[must_use]
    pub const fn define(self) -> &'static str {
        match self {
            Self::FasterLto => "TEENSY_OPT_FASTER_LTO",
            Self::Fast => "TEENSY_OPT_FAST",
            Self::FastLto => "TEENSY_OPT_FAST_LTO",
            Self::Fastest => "TEENSY_OPT_FASTEST",
            Self::FastestLto => "TEENSY_OPT_FASTEST_LTO",
            Self::FastestPureCode => "TEENSY_OPT_FASTEST_PURE_CODE",
            Self::FastestPureCodeLto => "TEENSY_OPT_FASTEST_PURE_CODE_LTO",
            Self::Debug => "TEENSY_OPT_DEBUG",
            Self::DebugLto => "TEENSY_OPT_DEBUG_LTO",
            Self::SmallestCodeLto => "TEENSY_OPT_SMALLEST_CODE_LTO",
            Self::Faster => "TEENSY_OPT_FASTER",
            Self::SmallestCode => "TEENSY_OPT_SMALLEST_CODE",
        }
    }

    /// The first profile (in priority order) whose define is present.
    #[must_use]
    pub fn from_defines(defines: &[Define]) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|profile| Define::contains(defines, profile.define()))
    }

    /// Flags added to both the compiler and the linker.
    #[must_use]
    pub const fn flags(self) -> &'static [&'static str] {
        match self {
            Self::Fast | Self::FastLto => &["-O1"],
            Self::Faster | Self::FasterLto => &["-O2"],
            Self::Fastest | Self::FastestLto => &["-O3"],
            Self::FastestPureCode | Self::FastestPureCodeLto => &["-O3", "-mpure-code"],
            Self::Debug | Self::DebugLto => &["-g", "-Og"],
            Self::SmallestCode | Self::SmallestCodeLto => &["-Os"],
        }
    }

    /// `true` for the `*_LTO` profiles.
    #[must_use]
    pub const fn lto(self) -> bool {
        matches!(
            self,
            Self::FasterLto
                | Self::FastLto
                | Self::FastestLto
                | Self::FastestPureCodeLto
                | Self::DebugLto
                | Self::SmallestCodeLto
        )
    }

    /// `true` for the execute-only (`-mpure-code`) profiles.
    #[must_use]
    pub const fn pure_code(self) -> bool {
        matches!(self, Self::FastestPureCode | Self::FastestPureCodeLto)
    }
}

// ── Outputs ─────────────────────────────────────────────────────────────────

/// A finished set of tool options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlagSet {
    /// Assembler flags.
    pub asflags: Vec<String>,
    /// Flags for preprocessed assembly (`.S`).
    pub asppflags: Vec<String>,
    /// C-only compiler flags.
    pub cflags: Vec<String>,
    /// C and C++ compiler flags.
    pub ccflags: Vec<String>,
    /// C++-only compiler flags.
    pub cxxflags: Vec<String>,
    /// Preprocessor defines.
    pub cppdefines: Vec<Define>,
    /// Linker flags.
    pub linkflags: Vec<String>,
    /// Libraries linked by name.
    pub libs: Vec<String>,
    /// `ranlib` flags.
    pub ranlibflags: Vec<String>,
    /// Include search path.
    pub cpppath: Vec<PathBuf>,
    /// Library search path.
    pub libpath: Vec<PathBuf>,
    /// Directories searched for Arduino libraries.
    pub libsource_dirs: Vec<PathBuf>,
}

impl FlagSet {
    fn compile_and_link(&mut self, flags: &[&str]) {
        self.ccflags.extend(owned(flags));
        self.linkflags.extend(owned(flags));
    }
}

/// Which size report the board needs after linking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SizeReportMode {
    /// Program and data totals against flash and RAM.
    Standard,
    /// Teensy 4: RAM1/RAM2/flash with ITCM block padding charged to RAM1.
    ItcmAware,
}

impl SizeReportMode {
    /// ITCM-aware for the `teensy4` core, standard otherwise.
    #[must_use]
    pub fn for_board(board: &BoardConfig) -> Self {
        if board.core() == Some("teensy4") {
            Self::ItcmAware
        } else {
            Self::Standard
        }
    }
}

/// A framework library compiled from sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LibrarySource {
    /// Library name inside the build directory.
    pub name: String,
    /// Source directory.
    pub dir: PathBuf,
    /// Source filter, if the library excludes files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src_filter: Option<String>,
}

/// Everything the configuration pass decides for one board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameworkConfig {
    /// Tool options.
    pub flags: FlagSet,
    /// Linker script taken from `build.arduino.ldscript`, when the board has
    /// no `build.ldscript` of its own.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ldscript_path: Option<String>,
    /// Optimization profile selected by a define, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimization: Option<OptimizationProfile>,
    /// Post-link size report.
    pub size_report: SizeReportMode,
    /// Libraries to build, in link order (variant first).
    pub libraries: Vec<LibrarySource>,
}

// ── Inputs ──────────────────────────────────────────────────────────────────

/// Installed framework packages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameworkPackages {
    /// Cores and variants (`framework-arduinoteensy-ts`).
    pub dir: PathBuf,
    /// Teensyduino libraries (`framework-arduinoteensy`).
    pub libs_dir: PathBuf,
    /// Version of the cores package, e.g. `1.159.0`.
    pub version: String,
}

/// Inputs of [`build_flags`].
#[derive(Debug, Clone, Copy)]
pub struct FlagInputs<'a> {
    /// Board being built.
    pub board: &'a BoardConfig,
    /// User defines.
    pub defines: &'a [Define],
    /// Host system (LTO job syntax differs on Windows).
    pub host: &'a HostSystem,
    /// Parallel LTO jobs (`-flto=<jobs>`).
    pub jobs: usize,
    /// Value of `__rtc_localtime` when `SET_CURRENT_TIME` is defined.
    pub unix_time: u64,
    /// Framework packages.
    pub framework: &'a FrameworkPackages,
}

// ── Builder ─────────────────────────────────────────────────────────────────

/// Resolve framework packages through `ctx` and build the configuration.
///
/// # Errors
///
/// Returns [`ToolchainError::PackageNotFound`] if a framework package or its
/// version is missing, and any error of [`build_flags`].
pub fn configure_framework(
    ctx: &impl BuildContext,
    jobs: usize,
    unix_time: u64,
) -> Result<FrameworkConfig, ToolchainError> {
    let missing = |name: &str| ToolchainError::PackageNotFound(name.to_owned());
    let framework = FrameworkPackages {
        dir: ctx
            .package_dir(FRAMEWORK_PACKAGE)
            .ok_or_else(|| missing(FRAMEWORK_PACKAGE))?,
        libs_dir: ctx
            .package_dir(FRAMEWORK_LIBS_PACKAGE)
            .ok_or_else(|| missing(FRAMEWORK_LIBS_PACKAGE))?,
        version: ctx
            .package_version(FRAMEWORK_PACKAGE)
            .ok_or_else(|| missing(FRAMEWORK_PACKAGE))?,
    };

    build_flags(&FlagInputs {
        board: ctx.board(),
        defines: ctx.defines(),
        host: ctx.host(),
        jobs,
        unix_time,
        framework: &framework,
    })
}

/// Build the configuration for `inputs.board`.
///
/// # Errors
///
/// Returns [`ToolchainError::MissingBoardField`] if the board has no
/// `build.core`, and [`ToolchainError::FrameworkVersion`] if the framework
/// version has no numeric minor component.
pub fn build_flags(inputs: &FlagInputs<'_>) -> Result<FrameworkConfig, ToolchainError> {
    let board = inputs.board;
    let core = board.core().ok_or_else(|| ToolchainError::MissingBoardField {
        board: board.id.clone(),
        key: "build.core",
    })?;
    let framework_dir = inputs.framework.dir.as_path();

    let mut flags = FlagSet::default();
    let mut ldscript_path = None;
    let mut optimization = None;
    let size_report = SizeReportMode::for_board(board);

    // User defines come first; everything below is appended after them.
    flags.cppdefines.extend(inputs.defines.iter().cloned());

    if !inputs
        .defines
        .iter()
        .any(|d| BUILTIN_USB_FLAGS.contains(&d.name.as_str()))
    {
        flags.cppdefines.push(Define::flag("USB_SERIAL"));
    }

    flags.cppdefines.extend([
        Define::valued("ARDUINO", ARDUINO_VERSION),
        Define::valued("TEENSYDUINO", teensyduino_version(&inputs.framework.version)?),
        Define::flag("CORE_TEENSY"),
    ]);
    flags.cpppath.push(framework_dir.join(core));
    flags
        .libsource_dirs
        .push(inputs.framework.libs_dir.join("libraries"));

    match core {
        "teensy" => avr_flags(&mut flags, board),
        "teensy3" | "teensy4" => {
            cortex_m_flags(&mut flags, board);

            let rtc_time = if Define::contains(inputs.defines, "SET_CURRENT_TIME") {
                inputs.unix_time
            } else {
                0
            };
            flags
                .linkflags
                .push(format!("-Wl,--defsym=__rtc_localtime={rtc_time}"));

            if !Define::contains(inputs.defines, "DISABLE_PRINTF_FLOAT") {
                flags.linkflags.push("-Wl,-u,_printf_float".to_owned());
            }

            if board.ldscript().is_none() {
                ldscript_path = board.arduino_ldscript().map(str::to_owned);
            }

            fpu_flags(&mut flags, &board.id);

            optimization = OptimizationProfile::from_defines(inputs.defines);
            optimization_flags(&mut flags, optimization, inputs);
        }
        other => tracing::debug!(core = other, "no flag set for core"),
    }

    let cpu = board.cpu();
    if cpu.contains("cortex-m") && (cpu.starts_with("cortex-m4") || cpu.starts_with("cortex-m0")) {
        flags.asflags.push("-mno-unaligned-access".to_owned());
        flags.ccflags.extend(owned(&[
            "-mno-unaligned-access",
            "-fsingle-precision-constant",
        ]));
        flags
            .linkflags
            .push("-fsingle-precision-constant".to_owned());
    }

    if core == "teensy" {
        flags.cpppath.push(framework_dir.to_path_buf());
    } else {
        flags.libpath.insert(0, framework_dir.join(core));
    }

    let libraries = library_sources(&mut flags, board, framework_dir, core);

    tracing::debug!(
        board = %board.id,
        core,
        ?optimization,
        defines = flags.cppdefines.len(),
        "built flag set"
    );

    Ok(FrameworkConfig {
        flags,
        ldscript_path,
        optimization,
        size_report,
        libraries,
    })
}

/// `TEENSYDUINO` is the minor component of the framework version
/// (`1.159.0` → `159`).
fn teensyduino_version(version: &str) -> Result<u32, ToolchainError> {
    version
        .split('.')
        .nth(1)
        .and_then(|minor| minor.parse().ok())
        .ok_or_else(|| ToolchainError::FrameworkVersion(version.to_owned()))
}

fn avr_flags(flags: &mut FlagSet, board: &BoardConfig) {
    let mmcu = format!("-mmcu={}", board.mcu());

    flags.asflags.push(mmcu.clone());
    flags
        .asppflags
        .extend(owned(&["-x", "assembler-with-cpp"]));
    flags.ccflags.extend(owned(&[
        "-Os",
        "-Wall",
        "-ffunction-sections",
        "-fdata-sections",
    ]));
    flags.ccflags.push(mmcu.clone());
    flags.cxxflags.extend(owned(&[
        "-fno-exceptions",
        "-felide-constructors",
        "-std=gnu++11",
        "-fpermissive",
    ]));
    flags.cppdefines.extend([
        Define::valued("F_CPU", board.f_cpu()),
        Define::flag("LAYOUT_US_ENGLISH"),
    ]);
    flags
        .linkflags
        .extend(owned(&["-Os", "-Wl,--gc-sections,--relax"]));
    flags.linkflags.push(mmcu);
    flags.libs.push("m".to_owned());
}

fn cortex_m_flags(flags: &mut FlagSet, board: &BoardConfig) {
    let mcpu = format!("-mcpu={}", board.cpu());

    flags.asflags.extend(["-mthumb".to_owned(), mcpu.clone()]);
    flags
        .asppflags
        .extend(owned(&["-x", "assembler-with-cpp"]));
    flags
        .cflags
        .extend(owned(&["-Wno-old-style-declaration", "-std=gnu17"]));
    flags.ccflags.extend(owned(&[
        "-Wall",
        "-Wextra",
        "-ffunction-sections",
        "-fdata-sections",
        "-mthumb",
    ]));
    flags.ccflags.push(mcpu.clone());
    flags
        .ccflags
        .extend(owned(&["-nostdlib", "--specs=nano.specs"]));
    flags.cxxflags.extend(owned(&[
        "-fno-exceptions",
        "-fno-non-call-exceptions",
        "-fno-unwind-tables",
        "-fno-asynchronous-unwind-tables",
        "-felide-constructors",
        "-fno-rtti",
        "-std=gnu++20",
        "-Wno-error=narrowing",
        "-Wno-volatile",
        "-fpermissive",
    ]));
    flags.cppdefines.extend([
        Define::valued("F_CPU", board.f_cpu()),
        Define::flag("LAYOUT_US_ENGLISH"),
    ]);
    flags.ranlibflags.push("-s".to_owned());
    flags.linkflags.extend(owned(&[
        "-ffunction-sections",
        "-fdata-sections",
        "-Wl,--gc-sections,--relax",
        "-nostartfiles",
        "-mthumb",
    ]));
    flags.linkflags.push(mcpu);
    flags.linkflags.push("--specs=nano.specs".to_owned());
    flags.libs.extend(owned(&["m", "stdc++"]));
}

fn fpu_flags(flags: &mut FlagSet, board_id: &str) {
    if !FPU_BOARDS.contains(&board_id) {
        return;
    }
    let fpv = if board_id.starts_with("teensy4") || board_id.starts_with("teensymm") {
        "5"
    } else {
        "4-sp"
    };
    let fpu = [
        "-mfloat-abi=hard".to_owned(),
        format!("-mfpu=fpv{fpv}-d16"),
    ];
    flags.asflags.extend(fpu.iter().cloned());
    flags.ccflags.extend(fpu.iter().cloned());
    flags.linkflags.extend(fpu);
}

fn optimization_flags(
    flags: &mut FlagSet,
    profile: Option<OptimizationProfile>,
    inputs: &FlagInputs<'_>,
) {
    let Some(profile) = profile else {
        // Teensy LC defaults to TEENSY_OPT_SMALLEST_CODE, every other board
        // to TEENSY_OPT_FASTER.
        if inputs.board.id == "teensylc" {
            flags.compile_and_link(&["-Os", "--specs=nano.specs"]);
        } else {
            flags.compile_and_link(&["-O2"]);
        }
        return;
    };

    flags.compile_and_link(profile.flags());
    if profile.pure_code() {
        flags.cppdefines.push(Define::flag("__PURE_CODE__"));
    }
    if profile.lto() {
        flags.ccflags.extend(owned(&["-flto", "-fipa-pta"]));
        if inputs.host.is_windows() {
            flags.linkflags.push("-flto".to_owned());
        } else {
            flags.linkflags.push(format!("-flto={}", inputs.jobs));
        }
    }
}

fn library_sources(
    flags: &mut FlagSet,
    board: &BoardConfig,
    framework_dir: &Path,
    core: &str,
) -> Vec<LibrarySource> {
    let mut libraries = Vec::with_capacity(2);
    if let Some(variant) = board.variant() {
        let dir = framework_dir.join("variants").join(variant);
        flags.cpppath.push(dir.clone());
        libraries.push(LibrarySource {
            name: "FrameworkArduinoVariant".to_owned(),
            dir,
            src_filter: None,
        });
    }
    libraries.push(LibrarySource {
        name: "FrameworkArduino".to_owned(),
        dir: framework_dir.join(core),
        src_filter: Some("+<*> -<Blink.cc>".to_owned()),
    });
    libraries
}

fn owned<'a>(items: &'a [&'a str]) -> impl Iterator<Item = String> + 'a {
    items.iter().map(|s| (*s).to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn teensyduino_is_minor_version() {
        assert_eq!(teensyduino_version("1.159.0").unwrap(), 159);
        assert_eq!(teensyduino_version("1.58").unwrap(), 58);
        assert!(matches!(
            teensyduino_version("2"),
            Err(ToolchainError::FrameworkVersion(_))
        ));
        assert!(teensyduino_version("1.x.0").is_err());
    }

    #[test]
    fn profile_priority_follows_selection_order() {
        let defines = [
            Define::flag("TEENSY_OPT_SMALLEST_CODE"),
            Define::flag("TEENSY_OPT_FAST"),
        ];
        assert_eq!(
            OptimizationProfile::from_defines(&defines),
            Some(OptimizationProfile::Fast)
        );
        assert_eq!(OptimizationProfile::from_defines(&[]), None);
    }

    #[test]
    fn every_profile_round_trips_through_its_define() {
        for profile in OptimizationProfile::ALL {
            let defines = [Define::flag(profile.define())];
            assert_eq!(OptimizationProfile::from_defines(&defines), Some(profile));
        }
    }

    #[test]
    fn lto_and_pure_code_classification() {
        assert!(OptimizationProfile::FastestPureCodeLto.lto());
        assert!(OptimizationProfile::FastestPureCodeLto.pure_code());
        assert!(!OptimizationProfile::Faster.lto());
        assert_eq!(OptimizationProfile::DebugLto.flags(), ["-g", "-Og"]);
    }
}

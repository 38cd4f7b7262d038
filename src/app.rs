use crate::cli::{Cli, Commands, QualityArg};
use anyhow::{Context, Result, bail};
use codecprof::config::Config;
use codecprof::engine::{
    CodecProfile, CodecRegistry, DerivationEngine, FfmpegCli, HwVendor, JsonDirStore, OptionSet, ProfileRegistry,
    RegisterOptions, StreamParams, SystemProbe, get_opts, hardware, visibility,
};
use std::process;
use std::sync::Arc;

/// Everything a command needs, built from the config.
struct Session {
    config: Config,
    library: Arc<FfmpegCli>,
    codecs: CodecRegistry,
}

pub fn run(cli: Cli) {
    if let Err(e) = dispatch(cli) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn dispatch(cli: Cli) -> Result<()> {
    if let Commands::InitConfig = cli.command {
        handle_init_config();
        return Ok(());
    }

    let ctx = setup(cli.no_probe)?;
    match cli.command {
        Commands::Codecs { enabled } => handle_codecs(&ctx, enabled),
        Commands::CheckHw => handle_check_hw(&ctx),
        Commands::Profiles => handle_profiles(&ctx),
        Commands::Show { name } => handle_show(&ctx, &name),
        Commands::Fields { name } => handle_fields(&ctx, &name),
        Commands::Derive {
            name,
            pix_fmt,
            sample_rate,
            global_header,
            quality_mode,
            size,
        } => handle_derive(&ctx, &name, pix_fmt, sample_rate, global_header, quality_mode, size),
        Commands::InitConfig => Ok(()),
    }
}

fn setup(no_probe: bool) -> Result<Session> {
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Warning: {:#}", e);
        eprintln!("Using built-in defaults. Run 'codecprof init-config' to create a config file.");
        Config::default()
    });

    let library = Arc::new(FfmpegCli::new(&config.probe.ffmpeg_path));
    let probe = SystemProbe::new(&config.probe.vainfo_path, config.probe.render_device.clone());
    let options = RegisterOptions {
        hw_probe: config.probe.vainfo_probe && !no_probe,
    };

    let codecs = CodecRegistry::new();
    codecs
        .register_all(library.as_ref(), &probe, options)
        .context("Codec registration failed")?;

    Ok(Session {
        config,
        library,
        codecs,
    })
}

fn load_profiles(ctx: &Session) -> Result<ProfileRegistry> {
    let dir = ctx.config.profiles_dir()?;
    let profiles = ProfileRegistry::new(JsonDirStore::new(&dir));
    let report = profiles
        .load_all(&ctx.codecs)
        .with_context(|| format!("Failed to load profiles from {}", dir.display()))?;
    for name in &report.unresolved {
        eprintln!("Warning: profile '{}' refers to an encoder that is not available", name);
    }
    Ok(profiles)
}

fn find_profile(ctx: &Session, name: &str) -> Result<Arc<CodecProfile>> {
    match load_profiles(ctx)?.find(name) {
        Some(profile) => Ok(profile),
        None => bail!("Profile '{}' not found", name),
    }
}

fn handle_codecs(ctx: &Session, enabled_only: bool) -> Result<()> {
    for codec in ctx.codecs.list() {
        if enabled_only && !codec.is_enabled() {
            continue;
        }
        println!(
            "{:<14} {:<6} {:<6} {:<4} {}",
            codec.name(),
            codec.kind().as_str(),
            codec.vendor().map(|v| v.as_str()).unwrap_or("-"),
            if codec.is_enabled() { "OK" } else { "-" },
            codec.title()
        );
    }
    Ok(())
}

fn handle_check_hw(ctx: &Session) -> Result<()> {
    println!("=== Hardware Encoder Diagnostics ===\n");

    println!("1. Devices:");
    match ctx
        .config
        .probe
        .render_device
        .clone()
        .or_else(hardware::detect_render_device)
    {
        Some(device) => println!("   Render device: {}", device),
        None => println!("   Render device: none found"),
    }
    match hardware::detect_nvidia_gpu() {
        Some(gpu) => println!("   NVIDIA GPU: {}", gpu),
        None => println!("   NVIDIA GPU: none found"),
    }
    println!();

    println!("2. Compiled-in vendors:");
    for vendor in HwVendor::ALL {
        println!(
            "   {}: {}",
            vendor.as_str(),
            if vendor.compiled_in() { "YES" } else { "NO" }
        );
    }
    println!();

    println!("3. Hardware encoders:");
    for codec in ctx.codecs.list().iter().filter(|c| c.descriptor.is_hardware()) {
        println!(
            "   {:<14} {:<4} {:?}",
            codec.name(),
            if codec.is_enabled() { "OK" } else { "FAIL" },
            codec.descriptor.hw_features
        );
    }
    Ok(())
}

fn handle_profiles(ctx: &Session) -> Result<()> {
    let profiles = load_profiles(ctx)?;
    if profiles.is_empty() {
        println!("No saved profiles in {}", ctx.config.profiles_dir()?.display());
        return Ok(());
    }
    for profile in profiles.list() {
        let usable = profile.base().is_auto() || ctx.codecs.is_enabled(profile.codec_name());
        println!(
            "{:<24} {:<6} {:<14} {}",
            profile.name(),
            profile.class_str(),
            profile.codec_name(),
            if usable { "" } else { "(unavailable)" }
        );
    }
    Ok(())
}

fn handle_show(ctx: &Session, name: &str) -> Result<()> {
    let profile = find_profile(ctx, name)?;
    println!("{}", serde_json::to_string_pretty(profile.as_ref())?);
    Ok(())
}

fn handle_fields(ctx: &Session, name: &str) -> Result<()> {
    let profile = find_profile(ctx, name)?;
    let codec = if profile.base().is_auto() {
        None
    } else {
        ctx.codecs.find(profile.codec_name())
    };
    let requested = OptionSet::BASE
        | match profile.as_ref() {
            CodecProfile::Video(_) => OptionSet::VIDEO | OptionSet::VAAPI,
            CodecProfile::Audio(_) => OptionSet::AUDIO,
            CodecProfile::Base(_) => OptionSet::empty(),
        };

    let visible = get_opts(codec.as_deref(), requested);
    println!("Fields: {}", visible.field_names().join(", "));

    let lists = [
        ("pix_fmt", visibility::get_list_pix_fmts(codec.as_deref())),
        ("sample_fmt", visibility::get_list_sample_fmts(codec.as_deref())),
        ("sample_rate", visibility::get_list_sample_rates(codec.as_deref())),
        ("channel_layout", visibility::get_list_channel_layouts(codec.as_deref())),
        ("profile", visibility::get_list_profiles(codec.as_deref())),
    ];
    for (field, list) in lists {
        if let Some(entries) = list {
            let keys: Vec<_> = entries.iter().map(|e| e.key.as_str()).collect();
            println!("{}: {}", field, keys.join(" "));
        }
    }
    Ok(())
}

fn handle_derive(
    ctx: &Session,
    name: &str,
    pix_fmt: Option<String>,
    sample_rate: Option<u32>,
    global_header: bool,
    quality_mode: Option<QualityArg>,
    size: Option<String>,
) -> Result<()> {
    let profile = find_profile(ctx, name)?;
    let engine = DerivationEngine::new(ctx.library.clone())
        .with_quality_mode(ctx.config.derive.quality_mode)
        .with_require_meta(ctx.config.derive.require_meta);
    let params = StreamParams {
        pix_fmt,
        sample_rate,
        global_header,
        quality_mode: quality_mode.map(Into::into),
        ..StreamParams::default()
    };

    let directives = engine
        .derive(&profile, &ctx.codecs, &params)
        .with_context(|| format!("Cannot derive options for '{}'", name))?;
    print!("{}", directives);

    if let (Some(size), Some(video)) = (size, profile.as_video()) {
        let (w, h) = parse_size(&size)?;
        let codec = ctx.codecs.find(profile.codec_name());
        let vendor = codec.as_ref().and_then(|c| c.vendor());
        let features = codec.map(|c| c.descriptor.hw_features).unwrap_or_default();
        for filter in video.filter_chain(vendor, features, w, h) {
            println!("filter: {}", filter);
        }
    }
    Ok(())
}

fn parse_size(size: &str) -> Result<(u32, u32)> {
    let (w, h) = size
        .split_once('x')
        .with_context(|| format!("Invalid size '{}', expected WxH", size))?;
    Ok((
        w.parse().with_context(|| format!("Invalid width '{}'", w))?,
        h.parse().with_context(|| format!("Invalid height '{}'", h))?,
    ))
}

fn handle_init_config() {
    match Config::config_path() {
        Ok(path) if path.exists() => match Config::load() {
            Ok(cfg) => {
                println!("Config loaded successfully from {}", path.display());
                println!("{:#?}", cfg);
            }
            Err(e) => {
                eprintln!("Config invalid: {:#}", e);
                process::exit(1);
            }
        },
        Ok(path) => {
            println!("Creating default config...");
            if let Err(err) = Config::ensure_default() {
                eprintln!("Failed to save default config: {:#}", err);
                process::exit(1);
            }
            println!("Default config saved to {}", path.display());
        }
        Err(e) => {
            eprintln!("Config path unknown: {:#}", e);
            process::exit(1);
        }
    }
}

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use appxforge_core::{PackageEntity, Texts};
use appxforge_exec::{run_tool, ExecError};
use appxforge_identity::install_path_leaf;

use crate::publisher::{publisher_from_manifest, PLACEHOLDER_PUBLISHER};
use crate::toolchain::Toolchain;

const SIGN_SUCCESS_MARKER: &str = "successfully signed";

#[derive(Debug)]
pub struct PipelineRun {
    entity: PackageEntity,
    skip_sign: bool,
    base_name: String,
    appx_path: PathBuf,
    pvk_path: PathBuf,
    cer_path: PathBuf,
    pfx_path: PathBuf,
}

impl PipelineRun {
    pub fn new(entity: PackageEntity, output_dir: &Path, skip_sign: bool) -> Self {
        let base_name = install_path_leaf(&entity.install_path);
        let artifact = |extension: &str| output_dir.join(format!("{base_name}.{extension}"));
        Self {
            appx_path: artifact("appx"),
            pvk_path: artifact("pvk"),
            cer_path: artifact("cer"),
            pfx_path: artifact("pfx"),
            base_name,
            entity,
            skip_sign,
        }
    }

    pub fn entity(&self) -> &PackageEntity {
        &self.entity
    }

    pub fn appx_path(&self) -> &Path {
        &self.appx_path
    }

    // One packaging attempt. Every fatal condition is absorbed here: the
    // caller gets a single boolean outcome plus the log stream.
    pub fn run(&self, toolchain: &Toolchain, texts: &Texts, log: &mut dyn FnMut(&str)) -> bool {
        let bin_dir = toolchain.bin_dir().to_path_buf();
        self.run_with_runner(toolchain, texts, log, |tool, args| {
            run_tool(tool, args, Some(&bin_dir))
        })
    }

    pub fn run_with_runner<R>(
        &self,
        toolchain: &Toolchain,
        texts: &Texts,
        log: &mut dyn FnMut(&str),
        runner: R,
    ) -> bool
    where
        R: FnMut(&Path, &[OsString]) -> Result<String, ExecError>,
    {
        match self.execute(toolchain, texts, log, runner) {
            Ok(()) => true,
            Err(err) => {
                log(&texts.tf("pack_error", &[("err", &err.to_string())]));
                false
            }
        }
    }

    fn execute<R>(
        &self,
        toolchain: &Toolchain,
        texts: &Texts,
        log: &mut dyn FnMut(&str),
        mut runner: R,
    ) -> Result<()>
    where
        R: FnMut(&Path, &[OsString]) -> Result<String, ExecError>,
    {
        if self.base_name.is_empty() {
            bail!(
                "package '{}' has no install location to pack",
                self.entity.package_full_name
            );
        }
        let install_dir = PathBuf::from(&self.entity.install_path);

        log(texts.t("pack_log_clean"));
        self.clean()?;

        log(texts.t("pack_log_pack"));
        run_step(
            &mut runner,
            texts,
            &toolchain.makeappx,
            &[
                os("pack"),
                os("-d"),
                install_dir.clone().into_os_string(),
                os("-p"),
                self.appx_path.clone().into_os_string(),
                os("-l"),
            ],
        )?;

        if self.skip_sign {
            log(texts.t("pack_log_skipped"));
            return Ok(());
        }

        log(texts.t("pack_log_publisher"));
        let publisher =
            publisher_from_manifest(&install_dir).unwrap_or_else(|| PLACEHOLDER_PUBLISHER.to_string());

        log(texts.t("pack_log_gen_cert"));
        run_step(
            &mut runner,
            texts,
            &toolchain.makecert,
            &[
                os("-n"),
                os(&publisher),
                os("-r"),
                os("-a"),
                os("sha256"),
                os("-len"),
                os("2048"),
                os("-cy"),
                os("end"),
                os("-h"),
                os("0"),
                os("-eku"),
                os("1.3.6.1.5.5.7.3.3"),
                os("-b"),
                os("01/01/2000"),
                os("-sv"),
                self.pvk_path.clone().into_os_string(),
                self.cer_path.clone().into_os_string(),
            ],
        )?;

        log(texts.t("pack_log_convert_cert"));
        run_step(
            &mut runner,
            texts,
            &toolchain.pvk2pfx,
            &[
                os("-pvk"),
                self.pvk_path.clone().into_os_string(),
                os("-spc"),
                self.cer_path.clone().into_os_string(),
                os("-pfx"),
                self.pfx_path.clone().into_os_string(),
            ],
        )?;

        log(texts.t("pack_log_signing"));
        let sign_output = run_step(
            &mut runner,
            texts,
            &toolchain.signtool,
            &[
                os("sign"),
                os("-fd"),
                os("SHA256"),
                os("-a"),
                os("-f"),
                self.pfx_path.clone().into_os_string(),
                self.appx_path.clone().into_os_string(),
            ],
        )?;

        // the signer sometimes exits zero without signing; trust only its own
        // success text
        if !sign_output.to_lowercase().contains(SIGN_SUCCESS_MARKER) {
            bail!("{}", texts.t("sign_no_success"));
        }

        log(texts.t("pack_log_sign_success"));
        log(texts.t("pack_log_install_cer"));
        log(texts.t("pack_log_install_appx"));
        Ok(())
    }

    fn clean(&self) -> Result<()> {
        if let Some(output_dir) = self.appx_path.parent() {
            fs::create_dir_all(output_dir).with_context(|| {
                format!("failed to create output directory: {}", output_dir.display())
            })?;
        }
        for stale in [
            &self.appx_path,
            &self.pvk_path,
            &self.cer_path,
            &self.pfx_path,
        ] {
            remove_file_if_exists(stale)?;
        }
        Ok(())
    }
}

fn run_step<R>(
    runner: &mut R,
    texts: &Texts,
    tool: &Path,
    args: &[OsString],
) -> Result<String>
where
    R: FnMut(&Path, &[OsString]) -> Result<String, ExecError>,
{
    runner(tool, args).map_err(|err| match err {
        ExecError::ToolMissing { tool } => anyhow!(texts.tf("tool_not_exist", &[("tool", &tool)])),
        ExecError::ToolExecutionFailed { tool, diagnostics } => anyhow!(texts.tf(
            "tool_failed",
            &[("tool", &tool), ("err", &diagnostics)]
        )),
        other => anyhow!(other.to_string()),
    })
}

fn remove_file_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => {
            Err(err).with_context(|| format!("failed to remove stale artifact: {}", path.display()))
        }
    }
}

fn os(value: &str) -> OsString {
    OsString::from(value)
}

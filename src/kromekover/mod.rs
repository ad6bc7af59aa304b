//! Stealth injection
//!
//! Registers evasion scripts that run before any page script and overrides
//! the network-level identity so headers and `navigator` agree with the
//! attempt's fingerprint.

use anyhow::{Context, Result};
use chromiumoxide::{Page, cdp};
use futures::future::join_all;
use tracing::{debug, warn};

mod config;
pub use config::StealthConfig;

use crate::fingerprint::ActiveFingerprint;

// Order matters: the config object must exist before the evasions read it
const EVASION_SCRIPTS: &[(&str, &str)] = &[
    (
        "navigator_webdriver",
        r"
        Object.defineProperty(Navigator.prototype, 'webdriver', { get: () => false });
        ",
    ),
    (
        "navigator_identity",
        r"
        const cfg = window.__ghostConfig;
        Object.defineProperty(Navigator.prototype, 'platform', { get: () => cfg.platform });
        Object.defineProperty(Navigator.prototype, 'language', { get: () => cfg.language });
        Object.defineProperty(Navigator.prototype, 'languages', { get: () => Object.freeze([...cfg.languages]) });
        Object.defineProperty(Navigator.prototype, 'hardwareConcurrency', { get: () => cfg.hardwareConcurrency });
        Object.defineProperty(Navigator.prototype, 'maxTouchPoints', { get: () => cfg.maxTouchPoints });
        ",
    ),
    (
        "screen_size",
        r"
        const cfg = window.__ghostConfig;
        Object.defineProperty(Screen.prototype, 'width', { get: () => cfg.screenWidth });
        Object.defineProperty(Screen.prototype, 'height', { get: () => cfg.screenHeight });
        Object.defineProperty(Screen.prototype, 'availWidth', { get: () => cfg.screenWidth });
        Object.defineProperty(Screen.prototype, 'availHeight', { get: () => cfg.screenHeight });
        ",
    ),
    (
        "navigator_plugins",
        r"
        const mockPlugins = [
            { name: 'PDF Viewer', filename: 'internal-pdf-viewer', description: 'Portable Document Format' },
            { name: 'Chrome PDF Viewer', filename: 'internal-pdf-viewer', description: 'Portable Document Format' },
        ];
        const pluginsProto = Object.getPrototypeOf(navigator.plugins);
        Object.defineProperty(Navigator.prototype, 'plugins', {
            get: () => {
                const plugins = {};
                mockPlugins.forEach((plugin, i) => {
                    plugins[i] = plugin;
                    plugins[plugin.name] = plugin;
                });
                Object.setPrototypeOf(plugins, pluginsProto);
                Object.defineProperty(plugins, 'length', { value: mockPlugins.length });
                return plugins;
            }
        });
        ",
    ),
    (
        "chrome_runtime",
        r"
        if (!window.chrome) {
            window.chrome = {};
        }
        if (!window.chrome.runtime) {
            window.chrome.runtime = {
                connect: () => ({
                    onMessage: { addListener: () => {}, removeListener: () => {} },
                    postMessage: () => {}
                })
            };
        }
        ",
    ),
    (
        "webgl_vendor",
        r"
        const cfg = window.__ghostConfig;
        const handler = {
            apply(target, ctx, args) {
                const param = (args && args[0]) || null;
                if (param === 37445) return cfg.webglVendor;
                if (param === 37446) return cfg.webglRenderer;
                return Reflect.apply(target, ctx, args);
            }
        };
        for (const ctxType of [window.WebGLRenderingContext, window.WebGL2RenderingContext]) {
            if (ctxType) {
                ctxType.prototype.getParameter = new Proxy(ctxType.prototype.getParameter, handler);
            }
        }
        ",
    ),
];

/// Build the script that publishes `config` as `window.__ghostConfig`
///
/// # Errors
/// Fails only if the config cannot be serialized.
pub fn config_script(config: &StealthConfig) -> Result<String> {
    let json = serde_json::to_string(config).context("Failed to serialize stealth config")?;
    Ok(format!(
        "Object.defineProperty(window, '__ghostConfig', {{ value: Object.freeze({json}), enumerable: false }});"
    ))
}

/// Wrap an evasion body so a failure in one never aborts the others
fn isolate(name: &str, body: &str) -> String {
    format!("(() => {{ try {{ {body} }} catch (e) {{ /* {name} */ }} }})();")
}

async fn add_script(page: &Page, source: String) -> Result<()> {
    page.execute(
        cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams {
            source,
            include_command_line_api: None,
            world_name: None,
            run_immediately: None,
        },
    )
    .await?;
    Ok(())
}

/// Apply every evasion and the network identity of `fingerprint` to `page`
///
/// Individual evasion failures are logged and tolerated; failing to publish
/// the config or to override the user agent is an error, since the page would
/// then present an inconsistent identity.
pub async fn inject(page: &Page, fingerprint: &ActiveFingerprint) -> Result<()> {
    let session_seed: Vec<u8> = (0..16).map(|_| rand::random::<u8>()).collect();
    let config = StealthConfig::from_fingerprint(fingerprint, hex::encode(session_seed));

    debug!("Injecting stealth config for platform {}", config.platform);
    add_script(page, config_script(&config)?)
        .await
        .context("Failed to inject stealth config")?;

    let results = join_all(
        EVASION_SCRIPTS
            .iter()
            .map(|(name, body)| async move { (*name, add_script(page, isolate(name, body)).await) }),
    )
    .await;

    let failed: Vec<&str> = results
        .iter()
        .filter_map(|(name, result)| result.as_ref().err().map(|_| *name))
        .collect();
    if !failed.is_empty() {
        warn!("Failed to inject {} evasion(s): {:?}", failed.len(), failed);
    }

    page.execute(cdp::browser_protocol::network::SetUserAgentOverrideParams {
        user_agent: fingerprint.user_agent.clone(),
        accept_language: Some(config.accept_language.clone()),
        platform: Some(config.platform.clone()),
        user_agent_metadata: None,
    })
    .await
    .context("Failed to override user agent")?;

    debug!(
        "Stealth injection complete: {}/{} evasions active",
        EVASION_SCRIPTS.len() - failed.len(),
        EVASION_SCRIPTS.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::FingerprintPool;

    #[test]
    fn config_script_embeds_fingerprint_values() {
        let fp = FingerprintPool::new().deterministic();
        let config = StealthConfig::from_fingerprint(&fp, "abcd".into());
        let script = config_script(&config).unwrap();

        assert!(script.contains("__ghostConfig"));
        assert!(script.contains(r#""platform":"Win32""#));
        assert!(script.contains(r#""screenWidth":1920"#));
        assert!(script.contains(r#""sessionSeed":"abcd""#));
    }

    #[test]
    fn evasions_are_isolated() {
        let wrapped = isolate("x", "throw new Error('boom');");
        assert!(wrapped.starts_with("(() => { try {"));
        assert!(wrapped.contains("catch (e)"));
    }
}

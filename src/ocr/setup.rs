use anyhow::{anyhow, Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::log;
use crate::paths::get_tesseract_dir;

const TESSDATA_REPO: &str = "https://github.com/tesseract-ocr/tessdata/raw/main";

/// Locations commonly used by package managers and installers.
const COMMON_EXECUTABLES: [&str; 5] = [
    r"C:\Program Files\Tesseract-OCR\tesseract.exe",
    r"C:\Program Files (x86)\Tesseract-OCR\tesseract.exe",
    "/usr/bin/tesseract",
    "/usr/local/bin/tesseract",
    "/opt/homebrew/bin/tesseract",
];

const COMMON_TESSDATA_DIRS: [&str; 6] = [
    r"C:\Program Files\Tesseract-OCR\tessdata",
    r"C:\Program Files (x86)\Tesseract-OCR\tessdata",
    "/usr/share/tesseract-ocr/5/tessdata",
    "/usr/share/tesseract-ocr/4.00/tessdata",
    "/usr/share/tessdata",
    "/opt/homebrew/share/tessdata",
];

pub struct TesseractPaths {
    pub executable: PathBuf,
    pub tessdata: PathBuf,
}

fn has_languages(dir: &Path, languages: &[String]) -> bool {
    languages
        .iter()
        .all(|lang| dir.join(format!("{}.traineddata", lang)).exists())
}

/// Makes sure Tesseract is runnable and every language in `languages` has
/// trained data. Missing language files are downloaded into the local
/// tessdata directory, seeded from a system installation when one exists.
pub fn ensure_tesseract(explicit: Option<&Path>, languages: &[String]) -> Result<TesseractPaths> {
    let executable = find_tesseract_executable(explicit)?;
    log(&format!("Tesseract executable: {}", executable.display()));

    if let Ok(tessdata) = find_tessdata_dir(languages) {
        log(&format!("Tesseract data found at: {}", tessdata.display()));
        return Ok(TesseractPaths {
            executable,
            tessdata,
        });
    }

    let tessdata = get_tesseract_dir().join("tessdata");
    fs::create_dir_all(&tessdata)
        .context(format!("Failed to create {}", tessdata.display()))?;

    for lang in languages {
        let target = tessdata.join(format!("{}.traineddata", lang));
        if target.exists() {
            continue;
        }
        if copy_from_system(lang, &target)? {
            continue;
        }
        download_traineddata(lang, &target)?;
    }

    log(&format!("Tesseract data ready at: {}", tessdata.display()));

    Ok(TesseractPaths {
        executable,
        tessdata,
    })
}

/// Copies `<lang>.traineddata` out of a system tessdata directory, if present.
fn copy_from_system(lang: &str, target: &Path) -> Result<bool> {
    let file_name = format!("{}.traineddata", lang);
    for dir in COMMON_TESSDATA_DIRS {
        let source = PathBuf::from(dir).join(&file_name);
        if source.exists() {
            log(&format!("Copying {} from: {}", file_name, source.display()));
            fs::copy(&source, target)?;
            return Ok(true);
        }
    }
    Ok(false)
}

/// Downloads trained data for one language from the tessdata repository.
fn download_traineddata(lang: &str, target: &Path) -> Result<()> {
    let url = format!("{}/{}.traineddata", TESSDATA_REPO, lang);
    log(&format!("Downloading {}.traineddata...", lang));

    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(300))
        .build()?;

    let response = client
        .get(&url)
        .header("User-Agent", "kart-scoreboard")
        .send()?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Failed to download {}.traineddata: HTTP {}",
            lang,
            response.status()
        ));
    }

    let bytes = response.bytes()?;
    let mut file = fs::File::create(target)?;
    file.write_all(&bytes)?;

    log(&format!(
        "Downloaded {}.traineddata ({} bytes)",
        lang,
        bytes.len()
    ));

    Ok(())
}

/// Finds the Tesseract executable: explicit override, local dir, PATH, then
/// common installation paths.
pub fn find_tesseract_executable(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(anyhow!(
            "Configured Tesseract executable does not exist: {}",
            path.display()
        ));
    }

    let tesseract_dir = get_tesseract_dir();
    for name in ["tesseract", "tesseract.exe"] {
        let local_exe = tesseract_dir.join(name);
        if local_exe.exists() {
            return Ok(local_exe);
        }
    }

    // Check PATH
    if let Ok(output) = std::process::Command::new("tesseract")
        .arg("--version")
        .output()
    {
        if output.status.success() {
            return Ok(PathBuf::from("tesseract"));
        }
    }

    for path in COMMON_EXECUTABLES {
        let p = PathBuf::from(path);
        if p.exists() {
            return Ok(p);
        }
    }

    Err(anyhow!("Tesseract not found. Please install Tesseract-OCR."))
}

/// Finds a tessdata directory holding trained data for all `languages`.
pub fn find_tessdata_dir(languages: &[String]) -> Result<PathBuf> {
    let local_tessdata = get_tesseract_dir().join("tessdata");
    if has_languages(&local_tessdata, languages) {
        return Ok(local_tessdata);
    }

    // TESSDATA_PREFIX may point at tessdata itself or at its parent
    if let Ok(prefix) = std::env::var("TESSDATA_PREFIX") {
        let p = PathBuf::from(&prefix);
        if has_languages(&p, languages) {
            return Ok(p);
        }
        let p = p.join("tessdata");
        if has_languages(&p, languages) {
            return Ok(p);
        }
    }

    for path in COMMON_TESSDATA_DIRS {
        let p = PathBuf::from(path);
        if has_languages(&p, languages) {
            return Ok(p);
        }
    }

    Err(anyhow!(
        "tessdata directory not found. Trained data required for: {}",
        languages.join(", ")
    ))
}

// Roster CSV import

use std::io::Read;
use std::path::Path;

use rollcall_recon::config::RosterConfig;
use rollcall_recon::model::Roster;

/// Read the roster file and parse it per the configured column layout.
pub fn load(path: &Path, config: &RosterConfig) -> Result<Roster, String> {
    let content = read_file_as_utf8(path)?;
    rollcall_recon::load_roster(&content, config).map_err(|e| e.to_string())
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, the
/// usual encoding of spreadsheet-tool CSV exports).
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file =
        std::fs::File::open(path).map_err(|e| format!("{}: {e}", path.display()))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| format!("{}: {e}", path.display()))?;

    // Try UTF-8 first; on failure, recover the buffer from the error
    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

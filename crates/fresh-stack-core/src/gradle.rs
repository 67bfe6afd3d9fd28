//! Flutter Android build fix-up: Kotlin DSL → Groovy.
//!
//! `flutter create` emits `settings.gradle.kts` / `build.gradle.kts`. The
//! toolchain fresh-stack targets expects the Groovy dialect, so after
//! generation the three build files are replaced with fixed templates.
//!
//! The templates are pure functions of their substitution parameters and
//! are reproduced byte-for-byte (no trailing newline). [`patch`] applies
//! them in a fixed order:
//!
//! 1. write `android/settings.gradle`
//! 2. remove `android/settings.gradle.kts`
//! 3. write `android/build.gradle`
//! 4. remove `android/build.gradle.kts`
//! 5. write `android/app/build.gradle`

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::error::{FileSystemError, FsOperation};

/// Kotlin Gradle plugin version declared in the root build file.
pub const KOTLIN_VERSION: &str = "1.9.24";

/// Android Gradle Plugin version declared in the root build file.
pub const ANDROID_GRADLE_PLUGIN_VERSION: &str = "8.3.2";

/// Plugin registration file Flutter writes next to the Android project.
pub const FLUTTER_PLUGINS_FILE: &str = ".flutter-plugins";

const SETTINGS_GRADLE: &str = r#"include ':app'
def flutterProjectRoot = rootProject.projectDir.parentFile.toPath()
def plugins = new Properties()
def pluginsFile = new File(rootProject.projectDir, '.flutter-plugins')
if (pluginsFile.exists()) {
    pluginsFile.withReader('UTF-8') { reader -> plugins.load(reader) }
}
plugins.each { name, path ->
    def pluginDirectory = flutterProjectRoot.resolve(path).resolve('android').toFile()
    include ":$name"
    project(":$name").projectDir = pluginDirectory
}"#;

const ROOT_BUILD_GRADLE: &str = r#"buildscript {
    ext.kotlin_version = '{{KOTLIN_VERSION}}'
    repositories {
        google()
        mavenCentral()
    }

    dependencies {
        classpath 'com.android.tools.build:gradle:{{AGP_VERSION}}'
        classpath "org.jetbrains.kotlin:kotlin-gradle-plugin:$kotlin_version"
    }
}

allprojects {
    repositories {
        google()
        mavenCentral()
    }
}

rootProject.buildDir = '../build'
subprojects {
    project.buildDir = "${rootProject.buildDir}/${project.name}"
}
subprojects {
    project.evaluationDependsOn(':app')
}

tasks.register("clean", Delete) {
    delete rootProject.buildDir
}"#;

const APP_BUILD_GRADLE: &str = r#"def localProperties = new Properties()
def localPropertiesFile = rootProject.file('local.properties')
if (localPropertiesFile.exists()) {
    localPropertiesFile.withReader('UTF-8') { reader ->
        localProperties.load(reader)
    }
}

def flutterRoot = localProperties.getProperty('flutter.sdk')
if (flutterRoot == null) {
    throw new GradleException("Flutter SDK not found. Define location with flutter.sdk in the local.properties file.")
}

def flutterVersionCode = localProperties.getProperty('flutter.versionCode')
if (flutterVersionCode == null) {
    flutterVersionCode = '1'
}

def flutterVersionName = localProperties.getProperty('flutter.versionName')
if (flutterVersionName == null) {
    flutterVersionName = '1.0'
}

apply plugin: 'com.android.application'
apply plugin: 'kotlin-android'
apply from: "$flutterRoot/packages/flutter_tools/gradle/flutter.gradle"

android {
    namespace "{{APPLICATION_ID}}"
    compileSdkVersion flutter.compileSdkVersion
    ndkVersion flutter.ndkVersion

    compileOptions {
        sourceCompatibility JavaVersion.VERSION_1_8
        targetCompatibility JavaVersion.VERSION_1_8
    }

    kotlinOptions {
        jvmTarget = '1.8'
    }

    sourceSets {
        main.java.srcDirs += 'src/main/kotlin'
    }

    defaultConfig {
        applicationId "{{APPLICATION_ID}}"
        minSdkVersion flutter.minSdkVersion
        targetSdkVersion flutter.targetSdkVersion
        versionCode flutterVersionCode.toInteger()
        versionName flutterVersionName
    }

    buildTypes {
        release {
            signingConfig signingConfigs.debug
        }
    }
}

flutter {
    source '../..'
}

dependencies {
    implementation "org.jetbrains.kotlin:kotlin-stdlib-jdk7:$kotlin_version"
}"#;

/// `android/settings.gradle`.
pub const fn settings_gradle() -> &'static str {
    SETTINGS_GRADLE
}

/// `android/build.gradle` for the given Kotlin and AGP versions.
pub fn root_build_gradle(kotlin_version: &str, agp_version: &str) -> String {
    ROOT_BUILD_GRADLE
        .replace("{{KOTLIN_VERSION}}", kotlin_version)
        .replace("{{AGP_VERSION}}", agp_version)
}

/// `android/app/build.gradle` for `<organization>.<app_base_name>`.
pub fn app_build_gradle(organization: &str, app_base_name: &str) -> String {
    APP_BUILD_GRADLE.replace(
        "{{APPLICATION_ID}}",
        &format!("{organization}.{app_base_name}"),
    )
}

/// Errors from the Gradle patcher.
#[derive(Error, Debug)]
pub enum GradleError {
    /// `flutter create` did not leave an `android` directory behind.
    #[error("no Android project at {}; did `flutter create` succeed?", .0.display())]
    MissingAndroidProject(PathBuf),

    /// The app directory has no final path component to derive an id from.
    #[error("cannot derive an application id from {}", .0.display())]
    NoBaseName(PathBuf),

    /// Reading, writing or removing a build file failed.
    #[error(transparent)]
    FileSystem(#[from] FileSystemError),
}

/// Input to [`patch`].
#[derive(Debug, Clone)]
pub struct GradlePatchContext {
    /// Root of the generated Flutter app.
    pub app_dir: PathBuf,
    /// Organization prefix for the application id.
    pub organization: String,
}

impl GradlePatchContext {
    /// Context for `app_dir` under `organization`.
    pub fn new(app_dir: impl Into<PathBuf>, organization: impl Into<String>) -> Self {
        Self {
            app_dir: app_dir.into(),
            organization: organization.into(),
        }
    }

    /// `<app_dir>/android`.
    pub fn android_dir(&self) -> PathBuf {
        self.app_dir.join("android")
    }

    /// Final component of `app_dir`.
    pub fn app_base_name(&self) -> Result<String, GradleError> {
        self.app_dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| GradleError::NoBaseName(self.app_dir.clone()))
    }

    /// `<organization>.<basename(app_dir)>`.
    pub fn application_id(&self) -> Result<String, GradleError> {
        Ok(format!("{}.{}", self.organization, self.app_base_name()?))
    }
}

/// A Flutter plugin module that `settings.gradle` will include.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginModule {
    /// Gradle project path (`:name`).
    pub include: String,
    /// Directory the module is wired to.
    pub project_dir: PathBuf,
}

/// What [`patch`] did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PatchReport {
    /// Files written, in order.
    pub written: Vec<PathBuf>,
    /// Kotlin DSL files that existed and were removed.
    pub removed: Vec<PathBuf>,
    /// Plugin modules the new settings file resolves to.
    pub plugins: Vec<PluginModule>,
}

/// Replace the Kotlin DSL build files under `<app_dir>/android`.
#[instrument(skip(context), fields(app_dir = %context.app_dir.display(), org = %context.organization))]
pub fn patch(context: &GradlePatchContext) -> Result<PatchReport, GradleError> {
    let android = context.android_dir();
    if !android.is_dir() {
        return Err(GradleError::MissingAndroidProject(android));
    }
    let base_name = context.app_base_name()?;
    let mut report = PatchReport::default();

    let settings = android.join("settings.gradle");
    write(&settings, settings_gradle())?;
    report.written.push(settings);
    remove_if_present(&android.join("settings.gradle.kts"), &mut report)?;

    let root_build = android.join("build.gradle");
    write(
        &root_build,
        &root_build_gradle(KOTLIN_VERSION, ANDROID_GRADLE_PLUGIN_VERSION),
    )?;
    report.written.push(root_build);
    remove_if_present(&android.join("build.gradle.kts"), &mut report)?;

    let app_build = android.join("app").join("build.gradle");
    write(
        &app_build,
        &app_build_gradle(&context.organization, &base_name),
    )?;
    report.written.push(app_build);

    report.plugins = plugin_modules(&android)?;
    info!(
        app = %base_name,
        plugins = report.plugins.len(),
        removed = report.removed.len(),
        "gradle files patched"
    );
    Ok(report)
}

/// Resolve the plugin modules `settings.gradle` includes for `android_dir`.
///
/// Mirrors the Groovy in [`settings_gradle`]: entries of
/// `<android_dir>/.flutter-plugins` are `name=path` pairs, and each path is
/// resolved against the Flutter project root (the parent of `android_dir`)
/// with `android` appended. A missing file yields no modules.
pub fn plugin_modules(android_dir: &Path) -> Result<Vec<PluginModule>, GradleError> {
    let plugins_file = android_dir.join(FLUTTER_PLUGINS_FILE);
    let contents = match fs::read_to_string(&plugins_file) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("no plugin registration file");
            return Ok(Vec::new());
        }
        Err(e) => return Err(FileSystemError::new(FsOperation::Read, plugins_file, e).into()),
    };

    let project_root = android_dir.parent().unwrap_or(android_dir);
    Ok(parse_properties(&contents)
        .into_iter()
        .map(|(name, path)| PluginModule {
            include: format!(":{name}"),
            project_dir: project_root.join(path).join("android"),
        })
        .collect())
}

/// Minimal `java.util.Properties` reader: `key=value`, `key:value` or
/// `key value`, `#`/`!` comments, backslash escapes. Later keys win.
fn parse_properties(contents: &str) -> Vec<(String, String)> {
    let mut entries: Vec<(String, String)> = Vec::new();
    for line in contents.lines() {
        let line = line.trim_start();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }

        let mut key = String::new();
        let mut chars = line.chars();
        let mut escaped = false;
        for c in chars.by_ref() {
            if escaped {
                key.push(c);
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if matches!(c, '=' | ':') || c.is_whitespace() {
                break;
            } else {
                key.push(c);
            }
        }
        let rest = chars.as_str().trim_start();
        let rest = rest
            .strip_prefix(['=', ':'])
            .map_or(rest, str::trim_start);
        let value = unescape(rest.trim_end());

        if let Some(existing) = entries.iter_mut().find(|(k, _)| *k == key) {
            existing.1 = value;
        } else {
            entries.push((key, value));
        }
    }
    entries
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('t') => out.push('\t'),
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn write(path: &Path, contents: &str) -> Result<(), GradleError> {
    fs::write(path, contents).map_err(|e| FileSystemError::new(FsOperation::Write, path, e))?;
    debug!(path = %path.display(), "wrote build file");
    Ok(())
}

fn remove_if_present(path: &Path, report: &mut PatchReport) -> Result<(), GradleError> {
    match fs::remove_file(path) {
        Ok(()) => {
            report.removed.push(path.to_path_buf());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(FileSystemError::new(FsOperation::Remove, path, e).into()),
    }
}

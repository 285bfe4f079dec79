//! Platform defaults: the standard pipeline and the standard module catalog.

use serde_json::{Value, json};

use crate::module::{FileType, ModOp, ModOpAction, OpFilter, OpFilterType, PipelineModule};
use crate::processor::{Args, ProcessorRef};

/// Standard container images.
pub mod containers {
    pub const CORE: &str = "plugins/core";
    pub const ANALYSIS: &str = "plugins/analysis";
}

/// Module providers.
pub mod provider {
    pub const PLATFORM: &str = "Platform";
    pub const CLARIFAI: &str = "Clarifai";
    pub const GOOGLE: &str = "Google";
    pub const AMAZON: &str = "Amazon";
    pub const MICROSOFT: &str = "Microsoft";
}

/// Module categories.
pub mod category {
    pub const PLATFORM_VISUAL: &str = "Platform Visual Intelligence";
    pub const PLATFORM_TIMELINE: &str = "Platform Timeline Extraction";
    pub const CLARIFAI_PUBLIC: &str = "Clarifai Public";
    pub const GOOGLE_VISION: &str = "Google Vision";
    pub const GOOGLE_VIDEO: &str = "Google Video Intelligence";
    pub const GOOGLE_S2TEXT: &str = "Google Speech-To-Text";
    pub const GOOGLE_DLP: &str = "Google Data Loss Prevention";
    pub const AWS_REKOGNITION: &str = "Amazon Rekognition";
    pub const AWS_TRANSCRIBE: &str = "Amazon Transcribe";
    pub const AZURE_VISION: &str = "Azure Computer Vision";
}

/// Module objectives.
pub mod objective {
    pub const LABEL_DETECTION: &str = "Label Detection";
    pub const OBJECT_DETECTION: &str = "Object Detection";
    pub const LANDMARK_DETECTION: &str = "Landmark Detection";
    pub const LOGO_DETECTION: &str = "Logo Detection";
    pub const FACE_RECOGNITION: &str = "Face Recognition";
    pub const FACE_DETECTION: &str = "Face Detection";
    pub const CLIPIFIER: &str = "Video Clip Generator";
    pub const EXPLICIT_DETECTION: &str = "Explicit Detection";
    pub const TEXT_DETECTION: &str = "Text Detection (OCR)";
    pub const IMAGE_TEXT_DETECTION: &str = "Image Text Detection";
    pub const SPEECH_RECOGNITION: &str = "Speech Recognition";
    pub const IMAGE_DESCRIPTION: &str = "Image Description";
}

pub const PRECACHE_PROCESSOR: &str = "plugins_core.core.PreCacheSourceFileProcessor";
pub const FILE_IMPORT_PROCESSOR: &str = "plugins_core.core.FileImportProcessor";
pub const IMAGE_PROXY_PROCESSOR: &str = "plugins_core.proxy.ImageProxyProcessor";
pub const VIDEO_PROXY_PROCESSOR: &str = "plugins_core.proxy.VideoProxyProcessor";
pub const SIMILARITY_PROCESSOR: &str = "plugins_analysis.platform.SimilarityProcessor";

const FILE_IMPORT_PATTERN: &str = ".*FileImportProcessor";
const VIDEO_INTELLIGENCE_PROCESSOR: &str = "plugins_analysis.google.AsyncVideoIntelligenceProcessor";

/// The platform baseline, terminated by the prepend marker.
pub fn standard_pipeline() -> Vec<ProcessorRef> {
    vec![
        ProcessorRef::new(PRECACHE_PROCESSOR, containers::CORE),
        ProcessorRef::new(FILE_IMPORT_PROCESSOR, containers::CORE),
        ProcessorRef::new(IMAGE_PROXY_PROCESSOR, containers::CORE),
        ProcessorRef::new(VIDEO_PROXY_PROCESSOR, containers::CORE),
        ProcessorRef::new(SIMILARITY_PROCESSOR, containers::ANALYSIS),
        ProcessorRef::prepend_marker(),
    ]
}

/// The modules the platform registers for every project.
pub fn standard_modules() -> Vec<PipelineModule> {
    let mut modules = platform_modules();
    modules.extend(clarifai_modules());
    modules.extend(google_modules());
    modules.extend(amazon_modules());
    modules.extend(azure_modules());
    modules
}

fn platform_modules() -> Vec<PipelineModule> {
    vec![
        standard_module(
            "platform-extract-layers",
            "Extract all layers of multi-layer or multi-page images as separate assets.",
            provider::PLATFORM,
            category::PLATFORM_TIMELINE,
            objective::CLIPIFIER,
            &[FileType::Images],
            vec![set_file_import_args(args(json!({"extract_image_pages": true})))],
        ),
        standard_module(
            "platform-object-detection",
            "Detect everyday objects in images and documents.",
            provider::PLATFORM,
            category::PLATFORM_VISUAL,
            objective::OBJECT_DETECTION,
            &[FileType::Images, FileType::Documents],
            vec![append_analysis(&["plugins_analysis.platform.ObjectDetectionProcessor"])],
        ),
        standard_module(
            "platform-face-detection",
            "Detect faces in images and documents.",
            provider::PLATFORM,
            category::PLATFORM_VISUAL,
            objective::FACE_RECOGNITION,
            &[FileType::Images, FileType::Documents],
            vec![append_analysis(&["plugins_analysis.platform.FaceDetectionProcessor"])],
        ),
        standard_module(
            "platform-label-detection",
            "Generate keyword labels for images and documents.",
            provider::PLATFORM,
            category::PLATFORM_VISUAL,
            objective::LABEL_DETECTION,
            &[FileType::Images, FileType::Documents],
            vec![append_analysis(&["plugins_analysis.platform.LabelDetectionProcessor"])],
        ),
        with_ocr(standard_module(
            "platform-text-detection",
            "Detect text in documents with OCR.",
            provider::PLATFORM,
            category::PLATFORM_VISUAL,
            objective::TEXT_DETECTION,
            &[FileType::Images, FileType::Documents],
            vec![append_analysis(&["plugins_analysis.platform.OcrProcessor"])],
        )),
    ]
}

/// Clarifai public models. Each module runs the image model and its video
/// counterpart.
fn clarifai_modules() -> Vec<PipelineModule> {
    vec![
        clarifai_module(
            "clarifai-label-detection",
            "Recognize over 11,000 concepts including objects, themes and moods.",
            objective::LABEL_DETECTION,
            &["LabelDetection"],
        ),
        clarifai_module(
            "clarifai-food-detection",
            "Recognize more than 1,000 food items and dishes down to the ingredient level.",
            objective::LABEL_DETECTION,
            &["FoodDetection"],
        ),
        clarifai_module(
            "clarifai-apparel-detection",
            "Detect items of clothing and fashion-related items.",
            objective::LABEL_DETECTION,
            &["ApparelDetection"],
        ),
        clarifai_module(
            "clarifai-travel-detection",
            "Recognize features of residential, hotel and travel-related properties.",
            objective::LABEL_DETECTION,
            &["TravelDetection"],
        ),
        clarifai_module(
            "clarifai-wedding-detection",
            "Recognize over 400 wedding-related concepts.",
            objective::LABEL_DETECTION,
            &["WeddingDetection"],
        ),
        clarifai_module(
            "clarifai-nsfw-detection",
            "Identify levels of nudity in visual content.",
            objective::EXPLICIT_DETECTION,
            &["ExplicitDetection"],
        ),
        clarifai_module(
            "clarifai-unsafe-detection",
            "Detect gore, drugs, explicit or suggestive nudity.",
            objective::EXPLICIT_DETECTION,
            &["ModerationDetection"],
        ),
        clarifai_module(
            "clarifai-weapon-detection",
            "Identify and classify weapons in images and videos.",
            objective::EXPLICIT_DETECTION,
            &["WeaponDetection"],
        ),
        clarifai_module(
            "clarifai-logo-detection",
            "Identify up to 500 company brands and logos.",
            objective::LOGO_DETECTION,
            &["LogoDetection"],
        ),
        clarifai_module(
            "clarifai-face-detection",
            "Detect human faces and their bounding boxes.",
            objective::FACE_DETECTION,
            &["FaceDetection"],
        ),
        clarifai_module(
            "clarifai-celebrity-detection",
            "Detect whether images contain the faces of celebrities.",
            objective::FACE_DETECTION,
            &["CelebrityDetection"],
        ),
        clarifai_module(
            "clarifai-texture-detection",
            "Identify textures and patterns within an image.",
            objective::LABEL_DETECTION,
            &["TexturesDetection"],
        ),
        clarifai_module(
            "clarifai-room-types-detection",
            "Recognize common scenes in rooms and around homes.",
            objective::LABEL_DETECTION,
            &["RoomTypesDetection"],
        ),
        clarifai_module(
            "clarifai-demographics-detection",
            "Predict age, gender and multicultural appearance for each detected face.",
            objective::LABEL_DETECTION,
            &["GenderDetection", "EthnicityDetection", "AgeDetection"],
        ),
    ]
}

fn google_modules() -> Vec<PipelineModule> {
    vec![
        google_vision_module(
            "gcp-label-detection",
            "Detect entities in an image across a broad group of categories.",
            objective::LABEL_DETECTION,
            "CloudVisionDetectLabels",
        ),
        google_vision_module(
            "gcp-object-detection",
            "Detect and extract multiple objects in an image.",
            objective::OBJECT_DETECTION,
            "CloudVisionDetectObjects",
        ),
        google_vision_module(
            "gcp-logo-detection",
            "Detect popular product logos within an image.",
            objective::LOGO_DETECTION,
            "CloudVisionDetectLogos",
        ),
        with_ocr(google_vision_module(
            "gcp-image-text-detection",
            "Detect text within a photographic image.",
            objective::IMAGE_TEXT_DETECTION,
            "CloudVisionDetectImageText",
        )),
        with_ocr(google_vision_module(
            "gcp-document-text-detection",
            "Detect text in documents with OCR.",
            objective::TEXT_DETECTION,
            "CloudVisionDetectDocumentText",
        )),
        google_vision_module(
            "gcp-landmark-detection",
            "Detect popular natural and man-made structures within an image.",
            objective::LANDMARK_DETECTION,
            "CloudVisionDetectLandmarks",
        ),
        video_intelligence_module(
            "gcp-video-label-detection",
            "Detect labels within a video.",
            objective::LABEL_DETECTION,
            "detect_labels",
        ),
        video_intelligence_module(
            "gcp-video-logo-detection",
            "Detect logos within a video.",
            objective::LOGO_DETECTION,
            "detect_logos",
        ),
        video_intelligence_module(
            "gcp-video-object-detection",
            "Detect objects within a video.",
            objective::OBJECT_DETECTION,
            "detect_objects",
        ),
        video_intelligence_module(
            "gcp-video-explicit-detection",
            "Detect explicit content in videos.",
            objective::EXPLICIT_DETECTION,
            "detect_explicit",
        ),
        video_intelligence_module(
            "gcp-video-text-detection",
            "Detect and extract text from video using OCR.",
            objective::TEXT_DETECTION,
            "detect_text",
        ),
        video_intelligence_module(
            "gcp-video-speech-transcription",
            "Transcribe the speech track of a video.",
            objective::SPEECH_RECOGNITION,
            "detect_speech",
        ),
        standard_module(
            "gcp-speech-to-text",
            "Convert audio to text in more than 120 languages.",
            provider::GOOGLE,
            category::GOOGLE_S2TEXT,
            objective::SPEECH_RECOGNITION,
            &[FileType::Videos],
            vec![append_analysis(&["plugins_analysis.google.AsyncSpeechToTextProcessor"])],
        ),
        with_ocr(standard_module(
            "gcp-dlp",
            "Extract names, dates and addresses from scanned documents.",
            provider::GOOGLE,
            category::GOOGLE_DLP,
            objective::TEXT_DETECTION,
            &[FileType::Images],
            vec![append_analysis(&["plugins_analysis.google.CloudDLPDetectEntities"])],
        )),
    ]
}

fn amazon_modules() -> Vec<PipelineModule> {
    vec![
        rekognition_module(
            "aws-label-detection",
            "Generate keyword labels for images and videos.",
            objective::LABEL_DETECTION,
            &[FileType::Images, FileType::Videos],
            &[
                "plugins_analysis.aws.RekognitionLabelDetection",
                "plugins_analysis.aws.video.RekognitionLabelDetection",
            ],
        ),
        rekognition_module(
            "aws-face-detection",
            "Detect faces with Amazon Rekognition.",
            objective::FACE_DETECTION,
            &[FileType::Images],
            &["plugins_analysis.aws.RekognitionFaceDetection"],
        ),
        rekognition_module(
            "aws-unsafe-detection",
            "Detect unsafe content with Amazon Rekognition.",
            objective::EXPLICIT_DETECTION,
            &[FileType::Images, FileType::Videos],
            &[
                "plugins_analysis.aws.RekognitionUnsafeDetection",
                "plugins_analysis.aws.video.RekognitionUnsafeDetection",
            ],
        ),
        rekognition_module(
            "aws-text-detection",
            "Detect text within an image with Amazon Rekognition.",
            objective::IMAGE_TEXT_DETECTION,
            &[FileType::Images],
            &["plugins_analysis.aws.RekognitionTextDetection"],
        ),
        rekognition_module(
            "aws-celebrity-detection",
            "Recognize thousands of celebrities across a wide range of categories.",
            objective::FACE_RECOGNITION,
            &[FileType::Images, FileType::Videos],
            &[
                "plugins_analysis.aws.RekognitionCelebrityDetection",
                "plugins_analysis.aws.video.RekognitionCelebrityDetection",
            ],
        ),
        rekognition_module(
            "aws-black-frame-detection",
            "Detect black frame sequences in videos.",
            objective::LABEL_DETECTION,
            &[FileType::Videos],
            &["plugins_analysis.aws.video.BlackFramesVideoDetectProcessor"],
        ),
        rekognition_module(
            "aws-end-credits-detection",
            "Identify the frames where the closing credits of a video start and end.",
            objective::LABEL_DETECTION,
            &[FileType::Videos],
            &["plugins_analysis.aws.video.EndCreditsVideoDetectProcessor"],
        ),
        standard_module(
            "aws-transcribe",
            "Convert speech to text with automatic speech recognition.",
            provider::AMAZON,
            category::AWS_TRANSCRIBE,
            objective::SPEECH_RECOGNITION,
            &[FileType::Videos],
            vec![append_analysis(&["plugins_analysis.aws.AmazonTranscribeProcessor"])],
        ),
    ]
}

/// Azure Computer Vision. Each module runs the image model and its video
/// counterpart.
fn azure_modules() -> Vec<PipelineModule> {
    vec![
        azure_module(
            "azure-object-detection",
            "Tag visual features in an image with bounding boxes.",
            objective::OBJECT_DETECTION,
            "ObjectDetection",
        ),
        azure_module(
            "azure-label-detection",
            "Tag objects, living things, scenery and actions in an image.",
            objective::LABEL_DETECTION,
            "LabelDetection",
        ),
        azure_module(
            "azure-image-description-detection",
            "Generate a human-readable sentence describing an image.",
            objective::IMAGE_DESCRIPTION,
            "ImageDescriptionDetection",
        ),
        azure_module(
            "azure-celebrity-detection",
            "Recognize thousands of celebrities across a wide range of categories.",
            objective::FACE_RECOGNITION,
            "CelebrityDetection",
        ),
        azure_module(
            "azure-landmark-detection",
            "Detect popular natural and man-made structures within an image.",
            objective::LANDMARK_DETECTION,
            "LandmarkDetection",
        ),
        azure_module(
            "azure-logo-detection",
            "Identify commercial brands from a database of global logos.",
            objective::LOGO_DETECTION,
            "LogoDetection",
        ),
        azure_module(
            "azure-category-detection",
            "Generate taxonomy-based categories for an image.",
            objective::LABEL_DETECTION,
            "CategoryDetection",
        ),
        azure_module(
            "azure-explicit-detection",
            "Detect adult material in images.",
            objective::EXPLICIT_DETECTION,
            "ExplicitContentDetection",
        ),
        azure_module(
            "azure-face-detection",
            "Detect human faces within an image.",
            objective::FACE_RECOGNITION,
            "FaceDetection",
        ),
        with_ocr(azure_module(
            "azure-text-detection",
            "Extract printed or handwritten text from images.",
            objective::TEXT_DETECTION,
            "TextDetection",
        )),
    ]
}

fn standard_module(
    name: &str,
    description: &str,
    provider: &str,
    category: &str,
    objective: &str,
    media: &[FileType],
    ops: Vec<ModOp>,
) -> PipelineModule {
    let mut module = PipelineModule::new(name, objective, ops).with_category(category);
    module.description = description.to_string();
    module.provider = provider.to_string();
    module.supported_media = media.to_vec();
    module.standard = true;
    module
}

fn video_intelligence_module(
    name: &str,
    description: &str,
    objective: &str,
    feature: &str,
) -> PipelineModule {
    let proc = ProcessorRef::new(VIDEO_INTELLIGENCE_PROCESSOR, containers::ANALYSIS)
        .with_arg(feature, true);
    standard_module(
        name,
        description,
        provider::GOOGLE,
        category::GOOGLE_VIDEO,
        objective,
        &[FileType::Videos],
        vec![ModOp::new(ModOpAction::AppendMerge(vec![proc]))],
    )
}

fn clarifai_module(
    name: &str,
    description: &str,
    objective: &str,
    models: &[&str],
) -> PipelineModule {
    let images = models
        .iter()
        .map(|model| format!("plugins_analysis.clarifai.Clarifai{model}Processor"));
    let videos = models
        .iter()
        .map(|model| format!("plugins_analysis.clarifai.ClarifaiVideo{model}Processor"));
    let class_names: Vec<String> = images.chain(videos).collect();
    standard_module(
        name,
        description,
        provider::CLARIFAI,
        category::CLARIFAI_PUBLIC,
        objective,
        &[FileType::Images, FileType::Videos],
        vec![append_analysis(&class_names)],
    )
}

fn google_vision_module(
    name: &str,
    description: &str,
    objective: &str,
    processor: &str,
) -> PipelineModule {
    standard_module(
        name,
        description,
        provider::GOOGLE,
        category::GOOGLE_VISION,
        objective,
        &[FileType::Images],
        vec![append_analysis(&[format!("plugins_analysis.google.{processor}")])],
    )
}

fn rekognition_module(
    name: &str,
    description: &str,
    objective: &str,
    media: &[FileType],
    class_names: &[&str],
) -> PipelineModule {
    standard_module(
        name,
        description,
        provider::AMAZON,
        category::AWS_REKOGNITION,
        objective,
        media,
        vec![append_analysis(class_names)],
    )
}

fn azure_module(name: &str, description: &str, objective: &str, model: &str) -> PipelineModule {
    standard_module(
        name,
        description,
        provider::MICROSOFT,
        category::AZURE_VISION,
        objective,
        &[FileType::Images, FileType::Videos],
        vec![append_analysis(&[
            format!("plugins_analysis.azure.AzureVision{model}"),
            format!("plugins_analysis.azure.AzureVideo{model}"),
        ])],
    )
}

/// Turn on text extraction in the file importer.
fn with_ocr(mut module: PipelineModule) -> PipelineModule {
    module
        .ops
        .push(set_file_import_args(args(json!({"ocr": true}))));
    module
}

fn append_analysis<S: AsRef<str>>(class_names: &[S]) -> ModOp {
    let fragment = class_names
        .iter()
        .map(|name| ProcessorRef::new(name.as_ref(), containers::ANALYSIS))
        .collect();
    ModOp::new(ModOpAction::Append(fragment))
}

fn set_file_import_args(args: Args) -> ModOp {
    let filter = OpFilter::new(OpFilterType::Regex, FILE_IMPORT_PATTERN)
        .unwrap_or_else(|_| OpFilter::substr("FileImportProcessor"));
    ModOp::new(ModOpAction::SetArgs(args)).with_filter(filter)
}

fn args(value: Value) -> Args {
    match value {
        Value::Object(map) => map,
        _ => Args::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_standard_pipeline_ends_with_marker() {
        let pipeline = standard_pipeline();
        assert!(pipeline.last().is_some_and(ProcessorRef::is_prepend_marker));
        assert_eq!(pipeline.iter().filter(|p| p.is_prepend_marker()).count(), 1);
    }

    #[test]
    fn test_standard_module_names_are_unique() {
        let modules = standard_modules();
        let names: HashSet<_> = modules.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names.len(), modules.len());
        assert!(modules.iter().all(|m| m.standard));
    }

    #[test]
    fn test_catalog_covers_every_provider() {
        let modules = standard_modules();
        assert_eq!(modules.len(), 51);

        let count = |provider: &str| modules.iter().filter(|m| m.provider == provider).count();
        assert_eq!(count(provider::PLATFORM), 5);
        assert_eq!(count(provider::CLARIFAI), 14);
        assert_eq!(count(provider::GOOGLE), 14);
        assert_eq!(count(provider::AMAZON), 8);
        assert_eq!(count(provider::MICROSOFT), 10);
    }

    #[test]
    fn test_clarifai_modules_pair_image_and_video_models() {
        let module = standard_modules()
            .into_iter()
            .find(|m| m.name == "clarifai-demographics-detection")
            .unwrap();
        let ModOpAction::Append(fragment) = &module.ops[0].action else {
            panic!("expected an APPEND op");
        };
        let names: Vec<_> = fragment.iter().map(|p| p.class_name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "plugins_analysis.clarifai.ClarifaiGenderDetectionProcessor",
                "plugins_analysis.clarifai.ClarifaiEthnicityDetectionProcessor",
                "plugins_analysis.clarifai.ClarifaiAgeDetectionProcessor",
                "plugins_analysis.clarifai.ClarifaiVideoGenderDetectionProcessor",
                "plugins_analysis.clarifai.ClarifaiVideoEthnicityDetectionProcessor",
                "plugins_analysis.clarifai.ClarifaiVideoAgeDetectionProcessor",
            ]
        );
        assert!(fragment.iter().all(|p| p.image == containers::ANALYSIS));
    }

    #[test]
    fn test_text_modules_turn_on_ocr() {
        for name in [
            "platform-text-detection",
            "gcp-image-text-detection",
            "gcp-document-text-detection",
            "gcp-dlp",
            "azure-text-detection",
        ] {
            let module = standard_modules().into_iter().find(|m| m.name == name).unwrap();
            let set_args = module
                .ops
                .iter()
                .find_map(|op| match &op.action {
                    ModOpAction::SetArgs(args) => Some(args),
                    _ => None,
                })
                .unwrap_or_else(|| panic!("{name} has no SET_ARGS op"));
            assert_eq!(set_args["ocr"], true, "{name}");
        }
    }

    #[test]
    fn test_file_import_filter_is_a_regex() {
        let module = standard_modules()
            .into_iter()
            .find(|m| m.name == "platform-text-detection")
            .unwrap();
        let filter = module.ops[1].filter.as_ref().unwrap();
        assert_eq!(filter.filter_type(), OpFilterType::Regex);
    }
}

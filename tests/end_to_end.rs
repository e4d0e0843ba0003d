mod common;

use cropcast::data::MIN_PRICE;
use cropcast::inference::scenario::{Outcome, Scenario, RAINFALL_LEVELS, SCENARIO_CROPS};
use cropcast::training::RegressorKind;
use cropcast::{CropError, CropPipeline, ErrorCode, TargetKind, TrainConfig};
use serde_json::json;

#[test]
fn rice_only_history_predicts_bounded_values() {
    let mut pipeline = CropPipeline::new(TrainConfig::default());
    pipeline.fit(&common::records(2004, 2010, &["Rice"])).unwrap();
    assert!(pipeline.is_trained());

    let documented = json!({
        "crop": "Rice",
        "rainfall_mm": 850,
        "temperature_c": 28,
        "humidity_percent": 75,
        "soil_ph": 6.8,
        "fertilizer_use_kg_ha": 70,
        "irrigation_area_percent": 25,
        "fuel_price_usd_liter": 1.3,
        "labor_cost_usd_day": 16,
        "market_demand_index": 110
    });
    for input in [documented, common::input("Rice")] {
        let p = pipeline.predict(&input).unwrap();
        assert!(p.is_finite());
        assert!(p.yield_ >= 0.0);
        assert!(p.production >= 0.0);
        assert!(p.price >= MIN_PRICE);
    }
}

#[test]
fn unseen_crop_is_reported() {
    let mut pipeline = CropPipeline::new(common::fast_config());
    pipeline.fit(&common::records(2004, 2010, &["Rice"])).unwrap();
    let err = pipeline.predict(&common::input("Quinoa")).unwrap_err();
    assert!(matches!(err, CropError::UnknownCategory { crop } if crop == "Quinoa"));
}

#[test]
fn untrained_pipeline_is_not_trained() {
    let pipeline = CropPipeline::new(common::fast_config());
    assert!(matches!(
        pipeline.predict(&common::input("Rice")),
        Err(CropError::NotTrained)
    ));
}

#[test]
fn input_validation() {
    let mut pipeline = CropPipeline::new(common::fast_config());
    pipeline.fit(&common::records(2004, 2012, &["Rice", "Millet"])).unwrap();

    let mut missing = common::input("Rice");
    missing.as_object_mut().unwrap().remove("soil_ph");
    assert!(matches!(
        pipeline.predict(&missing),
        Err(CropError::MissingField { field }) if field == "soil_ph"
    ));

    let mut wrong_type = common::input("Rice");
    wrong_type["rainfall_mm"] = json!("lots");
    assert!(matches!(
        pipeline.predict(&wrong_type),
        Err(CropError::InvalidInput(_))
    ));

    let mut extra = common::input("Millet");
    extra["notes"] = json!("ignored");
    assert_eq!(
        pipeline.predict(&extra).unwrap(),
        pipeline.predict(&common::input("Millet")).unwrap()
    );
}

#[test]
fn field_order_is_stable() {
    let mut pipeline = CropPipeline::new(common::fast_config());
    pipeline.fit(&common::records(2004, 2012, &["Rice", "Maize"])).unwrap();
    let names = pipeline.field_names().unwrap();
    assert_eq!(
        names,
        [
            "rainfall_mm",
            "temperature_c",
            "humidity_percent",
            "soil_ph",
            "fertilizer_use_kg_ha",
            "irrigation_area_percent",
            "fuel_price_usd_liter",
            "labor_cost_usd_day",
            "market_demand_index",
            "rainfall_squared",
            "temperature_humidity_interaction",
            "fertilizer_irrigation_interaction",
            "crop_encoded",
        ]
    );
    let v = pipeline.transform_record(&common::input("Rice")).unwrap();
    assert_eq!(v.fields, names);
    assert_eq!(v.values[9], 800.0 * 800.0);
    assert_eq!(v.values[12], 1.0);
}

#[test]
fn batch_matches_single_predictions() {
    let mut pipeline = CropPipeline::new(common::fast_config());
    pipeline
        .fit(&common::records(2004, 2014, &["Rice", "Millet", "Cotton"]))
        .unwrap();
    let inputs = vec![common::input("Cotton"), common::input("Rice"), common::input("Millet")];
    let batch = pipeline.predict_batch(&inputs).unwrap();
    assert_eq!(batch.len(), 3);
    for (i, input) in inputs.iter().enumerate() {
        assert_eq!(batch.row(i).unwrap(), pipeline.predict(input).unwrap());
    }

    let mut bad = inputs.clone();
    bad.push(common::input("Quinoa"));
    assert!(matches!(
        pipeline.predict_batch(&bad),
        Err(CropError::UnknownCategory { .. })
    ));
}

#[test]
fn refit_replaces_the_encoder() {
    let mut pipeline = CropPipeline::new(common::fast_config());
    pipeline.fit(&common::records(2004, 2012, &["Rice", "Millet"])).unwrap();
    assert!(pipeline.predict(&common::input("Millet")).is_ok());

    pipeline.fit(&common::records(2004, 2012, &["Rice"])).unwrap();
    assert!(matches!(
        pipeline.predict(&common::input("Millet")),
        Err(CropError::UnknownCategory { .. })
    ));
}

#[test]
fn failed_refit_keeps_previous_model() {
    let mut pipeline = CropPipeline::new(common::fast_config());
    pipeline.fit(&common::records(2004, 2012, &["Rice"])).unwrap();
    let before = pipeline.predict(&common::input("Rice")).unwrap();

    assert!(matches!(
        pipeline.fit(&common::records(2004, 2004, &["Rice"])),
        Err(CropError::InsufficientData(_))
    ));
    assert!(pipeline.is_trained());
    assert_eq!(pipeline.predict(&common::input("Rice")).unwrap(), before);
}

#[test]
fn reports_selection_and_importance() {
    let mut pipeline = CropPipeline::new(common::fast_config());
    pipeline
        .fit(&common::records(2004, 2021, &common::all_crops()))
        .unwrap();

    for target in TargetKind::ALL {
        let model = pipeline.target_model(target).unwrap();
        assert_eq!(model.candidates.len(), RegressorKind::ALL.len());
        assert_eq!(model.n_train + model.n_test, 18 * 8);
        assert!(model.test.rmse.is_finite());

        let imp = pipeline.feature_importance(target).unwrap();
        assert_eq!(imp.weights.len(), 13);
        assert_eq!(imp.family, model.family());
        assert!(imp.weights.windows(2).all(|w| w[0].weight >= w[1].weight));
    }
}

#[test]
fn scenario_queries_cover_every_combination() {
    let mut pipeline = CropPipeline::new(common::fast_config());
    pipeline
        .fit(&common::records(2004, 2021, &common::all_crops()))
        .unwrap();
    let runner = pipeline.scenarios(2025).unwrap();

    let crops = ["Rice", "Millet", "Groundnuts"];
    let forecast = runner.forecast(2030, &Scenario::defaults(), &crops);
    assert_eq!(forecast.len(), 9);
    assert!(forecast
        .iter()
        .all(|f| f.outcome.prediction().is_some_and(|p| p.price >= MIN_PRICE)));

    let sweep = runner.rainfall_sweep(&Scenario::average().conditions, &RAINFALL_LEVELS, &crops);
    assert_eq!(sweep.len(), RAINFALL_LEVELS.len() * crops.len());
    assert!(sweep.iter().all(|r| !r.outcome.is_failed()));

    let trend = runner
        .trends("Vegetables", &Scenario::average().conditions, 2025, 2035)
        .unwrap();
    assert_eq!(trend.len(), 11);
    assert_eq!(trend[0].year, 2025);

    assert!(runner.trends("Quinoa", &Scenario::average().conditions, 2025, 2026).is_err());
}

#[test]
fn unseen_scenario_crops_fail_only_their_rows() {
    let mut pipeline = CropPipeline::new(common::fast_config());
    pipeline.fit(&common::records(2004, 2014, &["Rice", "Millet"])).unwrap();
    let runner = pipeline.scenarios(2025).unwrap();

    let forecast = runner.forecast(2026, &Scenario::defaults(), &SCENARIO_CROPS);
    assert_eq!(forecast.len(), 3 * SCENARIO_CROPS.len());
    for row in &forecast {
        let known = row.crop == "Rice" || row.crop == "Millet";
        assert_eq!(row.outcome.prediction().is_some(), known, "{}", row.crop);
        if let Outcome::Failed { code, error } = &row.outcome {
            assert_eq!(*code, ErrorCode::UnknownCategory as u32);
            assert!(error.contains(&row.crop));
        }
    }

    let sweep = runner.rainfall_sweep(&Scenario::average().conditions, &[600.0], &["Sorghum", "Rice"]);
    assert!(sweep[0].outcome.is_failed());
    assert!(!sweep[1].outcome.is_failed());
}
